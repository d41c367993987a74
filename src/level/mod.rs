//! Level templates and the editor's editable level
//!
//! A [`Level`] is plain data: entity templates without physics bodies. A
//! `Simulation` clones them and creates the bodies.

pub mod collision;
pub mod xml;

use glam::Vec2;

pub use collision::{Overlap, Rect};
pub use xml::{LoadedLevel, load_level, parse_level, save_level, write_level};

use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::sim::{DeathTrap, Goal, Launcher, Platform, Treasure};

/// Immutable level template
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub goal: Goal,
    pub launcher: Launcher,
    pub platforms: Vec<Platform>,
    pub treasures: Vec<Treasure>,
    pub death_traps: Vec<DeathTrap>,
    /// Balls available
    pub attempts: u32,
    /// Target completion time (seconds), scoring only
    pub par_time: u32,
    /// Platform type codes the editor toolbox offers
    pub toolbox_types: String,
}

impl Level {
    pub fn new(name: impl Into<String>, goal: Goal, launcher: Launcher) -> Self {
        Self {
            name: name.into(),
            goal,
            launcher,
            platforms: Vec::new(),
            treasures: Vec::new(),
            death_traps: Vec::new(),
            attempts: DEFAULT_ATTEMPTS,
            par_time: DEFAULT_PAR_TIME,
            toolbox_types: String::new(),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_par_time(mut self, par_time: u32) -> Self {
        self.par_time = par_time;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn with_treasure(mut self, treasure: Treasure) -> Self {
        self.treasures.push(treasure);
        self
    }

    pub fn with_death_trap(mut self, trap: DeathTrap) -> Self {
        self.death_traps.push(trap);
        self
    }

    pub fn with_toolbox(mut self, types: impl Into<String>) -> Self {
        self.toolbox_types = types.into();
        self
    }

    /// Whether the editor toolbox offers platform type `code`
    pub fn allows_platform_type(&self, code: char) -> bool {
        self.toolbox_types.contains(code)
    }
}

/// A level being edited: the template plus player-placed platforms
#[derive(Debug, Clone)]
pub struct EditableLevel {
    level: Level,
    moveable: Vec<Platform>,
    additions_allowed: usize,
}

impl EditableLevel {
    pub fn new(level: Level, additions_allowed: usize) -> Self {
        Self {
            level,
            moveable: Vec::new(),
            additions_allowed,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn moveable_platforms(&self) -> &[Platform] {
        &self.moveable
    }

    pub fn additions_allowed(&self) -> usize {
        self.additions_allowed
    }

    pub fn additions_left(&self) -> usize {
        self.additions_allowed.saturating_sub(self.moveable.len())
    }

    /// Place a platform of toolbox type `code`
    pub fn add_platform(&mut self, code: char, origin: Vec2, size: Vec2) -> SimResult<usize> {
        if !self.level.allows_platform_type(code) {
            return Err(SimError::PlatformTypeNotAllowed(code));
        }
        if self.additions_left() == 0 {
            return Err(SimError::AdditionLimitReached {
                limit: self.additions_allowed,
            });
        }
        self.moveable.push(Platform::moveable(origin, size)?);
        Ok(self.moveable.len() - 1)
    }

    pub fn remove_platform(&mut self, index: usize) -> SimResult<Platform> {
        if index >= self.moveable.len() {
            return Err(SimError::NoSuchPlatform(index));
        }
        Ok(self.moveable.remove(index))
    }

    /// Drag a moveable platform so its top-left corner lands on `origin`
    pub fn move_platform(&mut self, index: usize, origin: Vec2) -> SimResult<()> {
        self.moveable
            .get_mut(index)
            .ok_or(SimError::NoSuchPlatform(index))?
            .move_to(origin)
    }

    /// Topmost moveable platform under `point` (for picking it up)
    pub fn platform_at(&self, point: Vec2) -> Option<usize> {
        self.moveable.iter().rposition(|p| p.contains(point))
    }

    /// Fixed platforms followed by moveable ones
    pub fn all_platforms(&self) -> impl Iterator<Item = &Platform> {
        self.level.platforms.iter().chain(self.moveable.iter())
    }

    /// Remove every placed platform
    pub fn restart(&mut self) {
        self.moveable.clear();
    }

    /// True if any placement overlaps (see [`EditableLevel::first_collision`])
    pub fn find_collision(&self) -> bool {
        self.first_collision().is_some()
    }

    /// The first overlapping pair, checking platforms against each other and
    /// the launcher zone, then death traps against platforms
    pub fn first_collision(&self) -> Option<Overlap> {
        let platforms: Vec<Rect> = self
            .all_platforms()
            .map(|p| Rect::from_origin_size(p.origin(), p.size()))
            .collect();
        let traps: Vec<Rect> = self
            .level
            .death_traps
            .iter()
            .map(|t| Rect::from_origin_size(t.origin(), t.region().size()))
            .collect();
        let zone = Rect::launcher_zone(self.level.launcher.position());
        collision::first_overlap(&platforms, zone, &traps)
    }

    /// Flatten into a level where placed platforms become part of the template
    pub fn to_level(&self) -> Level {
        let mut level = self.level.clone();
        level.platforms.extend(self.moveable.iter().cloned().map(|mut p| {
            p.fixed = true;
            p
        }));
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> Level {
        Level::new(
            "test",
            Goal::new(Vec2::new(1000.0, 100.0)).unwrap(),
            Launcher::new(Vec2::new(200.0, 600.0)).unwrap(),
        )
        .with_toolbox("AB")
    }

    fn platform(x: f32, y: f32, w: f32, h: f32) -> Platform {
        Platform::new(Vec2::new(x, y), Vec2::new(w, h), false).unwrap()
    }

    #[test]
    fn test_defaults() {
        let level = level();
        assert_eq!(level.attempts, DEFAULT_ATTEMPTS);
        assert_eq!(level.par_time, DEFAULT_PAR_TIME);
        assert!(level.allows_platform_type('A'));
        assert!(!level.allows_platform_type('C'));
    }

    #[test]
    fn test_addition_budget() {
        let mut editable = EditableLevel::new(level(), 2);
        editable.add_platform('A', Vec2::new(500.0, 100.0), Vec2::new(50.0, 10.0)).unwrap();
        editable.add_platform('B', Vec2::new(500.0, 200.0), Vec2::new(50.0, 10.0)).unwrap();
        assert_eq!(editable.additions_left(), 0);
        assert_eq!(
            editable.add_platform('A', Vec2::new(500.0, 300.0), Vec2::new(50.0, 10.0)),
            Err(SimError::AdditionLimitReached { limit: 2 })
        );
        editable.remove_platform(0).unwrap();
        assert_eq!(editable.additions_left(), 1);
        editable.restart();
        assert_eq!(editable.additions_left(), 2);
        assert!(editable.moveable_platforms().is_empty());
    }

    #[test]
    fn test_toolbox_filter() {
        let mut editable = EditableLevel::new(level(), 2);
        assert_eq!(
            editable.add_platform('Z', Vec2::new(500.0, 100.0), Vec2::new(50.0, 10.0)),
            Err(SimError::PlatformTypeNotAllowed('Z'))
        );
    }

    #[test]
    fn test_overlap_by_one_unit_collides() {
        let level = level()
            .with_platform(platform(500.0, 100.0, 50.0, 10.0))
            .with_platform(platform(549.0, 100.0, 50.0, 10.0));
        assert!(EditableLevel::new(level, 0).find_collision());
    }

    #[test]
    fn test_shared_edge_does_not_collide() {
        let level = level()
            .with_platform(platform(500.0, 100.0, 50.0, 10.0))
            .with_platform(platform(550.0, 100.0, 50.0, 10.0))
            .with_platform(platform(500.0, 110.0, 50.0, 10.0));
        assert!(!EditableLevel::new(level, 0).find_collision());
    }

    #[test]
    fn test_moveable_vs_fixed() {
        let level = level().with_platform(platform(500.0, 100.0, 50.0, 10.0));
        let mut editable = EditableLevel::new(level, 1);
        let idx = editable
            .add_platform('A', Vec2::new(700.0, 100.0), Vec2::new(50.0, 10.0))
            .unwrap();
        assert!(!editable.find_collision());
        editable.move_platform(idx, Vec2::new(520.0, 105.0)).unwrap();
        assert_eq!(
            editable.first_collision(),
            Some(Overlap::Platforms { first: 0, second: 1 })
        );
    }

    #[test]
    fn test_launcher_zone() {
        // Zone spans (100, 500) .. (300, 600)
        let inside = level().with_platform(platform(250.0, 550.0, 20.0, 20.0));
        assert_eq!(
            EditableLevel::new(inside, 0).first_collision(),
            Some(Overlap::LauncherZone { platform: 0 })
        );
        let below = level().with_platform(platform(250.0, 600.0, 20.0, 20.0));
        assert!(!EditableLevel::new(below, 0).find_collision());
    }

    #[test]
    fn test_death_trap_vs_platform() {
        let level = level()
            .with_platform(platform(500.0, 100.0, 50.0, 10.0))
            .with_death_trap(DeathTrap::new(Vec2::new(540.0, 80.0)).unwrap());
        assert_eq!(
            EditableLevel::new(level, 0).first_collision(),
            Some(Overlap::DeathTrap { trap: 0, platform: 0 })
        );
    }

    #[test]
    fn test_platform_picking() {
        let mut editable = EditableLevel::new(level(), 2);
        editable.add_platform('A', Vec2::new(500.0, 100.0), Vec2::new(50.0, 10.0)).unwrap();
        editable.add_platform('A', Vec2::new(520.0, 100.0), Vec2::new(50.0, 10.0)).unwrap();
        assert_eq!(editable.platform_at(Vec2::new(530.0, 105.0)), Some(1));
        assert_eq!(editable.platform_at(Vec2::new(505.0, 105.0)), Some(0));
        assert_eq!(editable.platform_at(Vec2::new(0.0, 0.0)), None);
        assert!(editable.move_platform(5, Vec2::ZERO).is_err());
    }

    #[test]
    fn test_to_level_merges_platforms() {
        let mut editable =
            EditableLevel::new(level().with_platform(platform(0.0, 0.0, 10.0, 10.0)), 1);
        editable.add_platform('B', Vec2::new(500.0, 100.0), Vec2::new(50.0, 10.0)).unwrap();
        let level = editable.to_level();
        assert_eq!(level.platforms.len(), 2);
        assert!(level.platforms.iter().all(|p| p.fixed));
    }
}
