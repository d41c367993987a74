//! Physics port and its rapier2d implementation
//!
//! Entities talk to the world only through [`PhysicsWorld`]. Everything here
//! is in meters; pixel conversion happens in the entities.

use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

// ---------------------------------------------------------------------------
// Port types
// ---------------------------------------------------------------------------

/// Opaque reference to a body in a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves
    Static,
    /// Moved only by explicit position updates
    Kinematic,
    /// Moved by forces, gravity and contacts
    Dynamic,
}

/// Collider shape (meters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_width: f32, half_height: f32 },
}

/// Material properties for a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.5,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl From<crate::config::MaterialConfig> for Material {
    fn from(m: crate::config::MaterialConfig) -> Self {
        Self {
            restitution: m.restitution,
            friction: m.friction,
            linear_damping: m.linear_damping,
            angular_damping: m.angular_damping,
        }
    }
}

/// Description of a body to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: Shape,
    /// Center position (meters)
    pub position: Vec2,
    /// Detects overlap without collision response
    pub sensor: bool,
    /// Continuous collision detection for fast movers
    pub ccd: bool,
    pub material: Material,
}

impl BodyDesc {
    /// Solid static body
    pub fn fixed(shape: Shape, position: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            shape,
            position,
            sensor: false,
            ccd: false,
            material: Material::default(),
        }
    }

    /// Static overlap-only body
    pub fn sensor(shape: Shape, position: Vec2) -> Self {
        Self {
            sensor: true,
            ..Self::fixed(shape, position)
        }
    }

    pub fn kinematic(shape: Shape, position: Vec2) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            ..Self::fixed(shape, position)
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// A contact edge between two bodies, reported after a world step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// `true` when the contact just started, `false` when it ended
    pub started: bool,
}

impl Contact {
    /// The body on the other side of `body`, if `body` is part of this contact
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Minimal physics engine interface the simulation needs
pub trait PhysicsWorld {
    /// Create an empty world with the given gravity (m/s²)
    fn with_gravity(gravity: Vec2) -> Self
    where
        Self: Sized;

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    fn kind(&self, body: BodyHandle) -> Option<BodyKind>;

    /// Switching to a non-dynamic kind also clears velocity and spin
    fn set_kind(&mut self, body: BodyHandle, kind: BodyKind);

    /// Disabled bodies are skipped by the solver and contact detection
    fn set_enabled(&mut self, body: BodyHandle, enabled: bool);

    fn position(&self, body: BodyHandle) -> Vec2;

    /// Teleport a body (no swept motion)
    fn set_position(&mut self, body: BodyHandle, position: Vec2);

    fn velocity(&self, body: BodyHandle) -> Vec2;

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    /// Whether the engine has put the body to sleep (velocity is zero)
    fn is_sleeping(&self, body: BodyHandle) -> bool;

    /// Advance by `dt` seconds, appending contact edges to `contacts`
    fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>);

    fn body_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Conversion helpers (private) - glam <-> nalgebra
// ---------------------------------------------------------------------------

fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn to_rapier(kind: BodyKind) -> RigidBodyType {
    match kind {
        BodyKind::Static => RigidBodyType::Fixed,
        BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        BodyKind::Dynamic => RigidBodyType::Dynamic,
    }
}

fn from_rapier(kind: RigidBodyType) -> BodyKind {
    match kind {
        RigidBodyType::Fixed => BodyKind::Static,
        RigidBodyType::Dynamic => BodyKind::Dynamic,
        RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
            BodyKind::Kinematic
        }
    }
}

// ---------------------------------------------------------------------------
// Event collector
// ---------------------------------------------------------------------------

struct ContactCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<CollisionEvent> {
        self.collisions
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collisions.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

/// [`PhysicsWorld`] backed by rapier2d
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ContactCollector,
    /// Indexed by `BodyHandle.0`
    handles: Vec<(RigidBodyHandle, ColliderHandle)>,
}

impl RapierWorld {
    fn body(&self, body: BodyHandle) -> Option<&RigidBody> {
        let (rb, _) = self.handles.get(body.0 as usize)?;
        self.bodies.get(*rb)
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let (rb, _) = self.handles.get(body.0 as usize)?;
        self.bodies.get_mut(*rb)
    }

    fn collider_to_handle(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let parent = self.colliders.get(collider)?.parent()?;
        let rb = self.bodies.get(parent)?;
        Some(BodyHandle(rb.user_data as u32))
    }
}

impl PhysicsWorld for RapierWorld {
    fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity: to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ContactCollector::new(),
            handles: Vec::new(),
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.handles.len() as u32);

        let rb = RigidBodyBuilder::new(to_rapier(desc.kind))
            .translation(to_na(desc.position))
            .linear_damping(desc.material.linear_damping)
            .angular_damping(desc.material.angular_damping)
            .ccd_enabled(desc.ccd)
            .user_data(handle.0 as u128)
            .build();
        let body_handle = self.bodies.insert(rb);

        let builder = match desc.shape {
            Shape::Circle { radius } => ColliderBuilder::ball(radius),
            Shape::Rect {
                half_width,
                half_height,
            } => ColliderBuilder::cuboid(half_width, half_height),
        };
        // Sensors also track the kinematic ball so teleporting it away ends the contact
        let collision_types = if desc.sensor {
            ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_FIXED
        } else {
            ActiveCollisionTypes::default()
        };
        let collider = builder
            .sensor(desc.sensor)
            .active_collision_types(collision_types)
            .restitution(desc.material.restitution)
            .friction(desc.material.friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.handles.push((body_handle, collider_handle));
        handle
    }

    fn kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.body(body).map(|rb| from_rapier(rb.body_type()))
    }

    fn set_kind(&mut self, body: BodyHandle, kind: BodyKind) {
        if let Some(rb) = self.body_mut(body) {
            if kind != BodyKind::Dynamic {
                rb.set_linvel(vector![0.0, 0.0], true);
                rb.set_angvel(0.0, true);
            }
            rb.set_body_type(to_rapier(kind), true);
        }
    }

    fn set_enabled(&mut self, body: BodyHandle, enabled: bool) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_enabled(enabled);
        }
    }

    fn position(&self, body: BodyHandle) -> Vec2 {
        self.body(body)
            .map(|rb| from_na(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_translation(to_na(position), true);
        }
    }

    fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.body(body)
            .map(|rb| from_na(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(to_na(velocity), true);
        }
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.body(body).is_some_and(|rb| rb.is_sleeping())
    }

    fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );

        // Resolve collider handles -> port handles via user_data
        for event in self.collector.drain() {
            let (c1, c2, started) = match event {
                CollisionEvent::Started(c1, c2, _) => (c1, c2, true),
                CollisionEvent::Stopped(c1, c2, _) => (c1, c2, false),
            };
            if let (Some(a), Some(b)) = (self.collider_to_handle(c1), self.collider_to_handle(c2))
            {
                contacts.push(Contact { a, b, started });
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn ball_desc(position: Vec2) -> BodyDesc {
        BodyDesc {
            kind: BodyKind::Dynamic,
            ..BodyDesc::fixed(Shape::Circle { radius: 0.15 }, position)
        }
    }

    #[test]
    fn test_create_bodies() {
        let mut world = RapierWorld::with_gravity(Vec2::new(0.0, 9.81));
        let a = world.create_body(&ball_desc(Vec2::new(1.0, 1.0)));
        let b = world.create_body(&BodyDesc::sensor(
            Shape::Rect {
                half_width: 0.5,
                half_height: 0.5,
            },
            Vec2::new(3.0, 1.0),
        ));
        assert_ne!(a, b);
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.kind(a), Some(BodyKind::Dynamic));
        assert_eq!(world.kind(b), Some(BodyKind::Static));
        assert_eq!(world.position(a), Vec2::new(1.0, 1.0));
        assert_eq!(world.kind(BodyHandle(99)), None);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = RapierWorld::with_gravity(Vec2::new(0.0, 9.81));
        let ball = world.create_body(&ball_desc(Vec2::new(1.0, 1.0)));
        let mut contacts = Vec::new();
        for _ in 0..10 {
            world.step(DT, &mut contacts);
        }
        assert!(world.position(ball).y > 1.0);
        assert!(world.velocity(ball).y > 0.0);
    }

    #[test]
    fn test_kinematic_body_ignores_gravity() {
        let mut world = RapierWorld::with_gravity(Vec2::new(0.0, 9.81));
        let ball = world.create_body(&BodyDesc::kinematic(
            Shape::Circle { radius: 0.15 },
            Vec2::new(1.0, 1.0),
        ));
        let mut contacts = Vec::new();
        for _ in 0..10 {
            world.step(DT, &mut contacts);
        }
        assert_eq!(world.position(ball), Vec2::new(1.0, 1.0));

        world.set_kind(ball, BodyKind::Dynamic);
        world.step(DT, &mut contacts);
        assert!(world.position(ball).y > 1.0);
    }

    #[test]
    fn test_leaving_dynamic_clears_velocity() {
        let mut world = RapierWorld::with_gravity(Vec2::new(0.0, 9.81));
        let ball = world.create_body(&ball_desc(Vec2::new(1.0, 1.0)));
        world.set_velocity(ball, Vec2::new(3.0, -2.0));
        world.set_kind(ball, BodyKind::Kinematic);
        assert_eq!(world.velocity(ball), Vec2::ZERO);

        let mut contacts = Vec::new();
        world.step(DT, &mut contacts);
        assert_eq!(world.position(ball), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_sensor_reports_start_edge() {
        let mut world = RapierWorld::with_gravity(Vec2::ZERO);
        let ball = world.create_body(&ball_desc(Vec2::new(0.0, 0.0)));
        let sensor = world.create_body(&BodyDesc::sensor(
            Shape::Rect {
                half_width: 0.5,
                half_height: 2.0,
            },
            Vec2::new(2.0, 0.0),
        ));
        world.set_velocity(ball, Vec2::new(5.0, 0.0));

        let mut contacts = Vec::new();
        for _ in 0..60 {
            world.step(DT, &mut contacts);
        }

        let started: Vec<_> = contacts.iter().filter(|c| c.started).collect();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].other(ball), Some(sensor));
        // Sensors don't push back
        assert!(world.velocity(ball).x > 4.9);
    }

    #[test]
    fn test_contact_other() {
        let contact = Contact {
            a: BodyHandle(1),
            b: BodyHandle(2),
            started: true,
        };
        assert_eq!(contact.other(BodyHandle(1)), Some(BodyHandle(2)));
        assert_eq!(contact.other(BodyHandle(2)), Some(BodyHandle(1)));
        assert_eq!(contact.other(BodyHandle(3)), None);
    }
}
