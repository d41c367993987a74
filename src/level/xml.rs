//! Level file format
//!
//! ```xml
//! <level balls="3" par-seconds="60" toolbox-types="AB">
//!   <launcher x="200" y="600"/>
//!   <goal x="1100" y="100"/>
//!   <platform x="400" y="500" width="120" height="20" breakable="false"/>
//!   <treasure x="640" y="300"/>
//!   <deathtrap x="800" y="650"/>
//! </level>
//! ```
//!
//! Parsing is tolerant: bad or missing attributes fall back to defaults (or
//! drop the element) and are reported as warnings. Only malformed XML and a
//! missing goal or launcher are errors.

use std::io::BufRead;
use std::path::Path;

use glam::Vec2;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::Level;
use crate::consts::{DEFAULT_ATTEMPTS, DEFAULT_PAR_TIME};
use crate::error::LevelError;
use crate::sim::{DeathTrap, Goal, Launcher, Platform, Treasure};

/// A parsed level plus everything that had to be patched up
#[derive(Debug, Clone)]
pub struct LoadedLevel {
    pub level: Level,
    pub warnings: Vec<String>,
}

/// Collects warnings and mirrors them to the log
#[derive(Default)]
struct Warnings(Vec<String>);

impl Warnings {
    fn push(&mut self, message: String) {
        log::warn!("{message}");
        self.0.push(message);
    }
}

/// Parse a level document
pub fn parse_level(xml: &str) -> Result<LoadedLevel, LevelError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    parse_level_reader(&mut reader)
}

/// Load a level file; the level is named after the file stem
pub fn load_level(path: impl AsRef<Path>) -> Result<LoadedLevel, LevelError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut loaded = parse_level(&xml)?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        loaded.level.name = stem.to_string();
    }
    log::info!(
        "Loaded level '{}' ({} platforms, {} treasures, {} death traps, {} warnings)",
        loaded.level.name,
        loaded.level.platforms.len(),
        loaded.level.treasures.len(),
        loaded.level.death_traps.len(),
        loaded.warnings.len()
    );
    Ok(loaded)
}

fn parse_level_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<LoadedLevel, LevelError> {
    let mut buf = Vec::new();
    let mut warnings = Warnings::default();

    let mut header: Option<(u32, u32, String)> = None;
    let mut goal: Option<Goal> = None;
    let mut launcher: Option<Launcher> = None;
    let mut platforms = Vec::new();
    let mut treasures = Vec::new();
    let mut death_traps = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"level" => header = Some(parse_header(e, &mut warnings)),
                b"platform" => {
                    if let Some(platform) = parse_platform(e, &mut warnings) {
                        platforms.push(platform);
                    }
                }
                b"treasure" => {
                    if let Some(pos) = parse_position(e, "treasure", &mut warnings) {
                        push_entity(Treasure::new(pos), "treasure", &mut treasures, &mut warnings);
                    }
                }
                b"deathtrap" => {
                    if let Some(pos) = parse_position(e, "deathtrap", &mut warnings) {
                        push_entity(
                            DeathTrap::new(pos),
                            "deathtrap",
                            &mut death_traps,
                            &mut warnings,
                        );
                    }
                }
                b"goal" => {
                    if let Some(pos) = parse_position(e, "goal", &mut warnings) {
                        set_unique(Goal::new(pos), "goal", &mut goal, &mut warnings)?;
                    }
                }
                b"launcher" => {
                    if let Some(pos) = parse_position(e, "launcher", &mut warnings) {
                        set_unique(Launcher::new(pos), "launcher", &mut launcher, &mut warnings)?;
                    }
                }
                other => {
                    log::debug!("Ignoring unknown element <{}>", String::from_utf8_lossy(other));
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(LevelError::Xml(e.to_string())),
        }
        buf.clear();
    }

    let (attempts, par_time, toolbox_types) = header.ok_or(LevelError::MissingElement("level"))?;
    let goal = goal.ok_or(LevelError::MissingElement("goal"))?;
    let launcher = launcher.ok_or(LevelError::MissingElement("launcher"))?;

    let mut level = Level::new("untitled", goal, launcher)
        .with_attempts(attempts)
        .with_par_time(par_time)
        .with_toolbox(toolbox_types);
    level.platforms = platforms;
    level.treasures = treasures;
    level.death_traps = death_traps;

    Ok(LoadedLevel {
        level,
        warnings: warnings.0,
    })
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return attr.unescape_value().ok().map(|value| value.into_owned());
        }
    }
    None
}

/// Unsigned level attribute with a fallback
fn parse_count(e: &BytesStart, name: &str, default: u32, warnings: &mut Warnings) -> u32 {
    match get_attribute(e, name) {
        None => {
            warnings.push(format!("level is missing '{name}', using {default}"));
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("level has invalid '{name}'=\"{raw}\", using {default}"));
            default
        }),
    }
}

fn parse_header(e: &BytesStart, warnings: &mut Warnings) -> (u32, u32, String) {
    let attempts = parse_count(e, "balls", DEFAULT_ATTEMPTS, warnings);
    let par_time = parse_count(e, "par-seconds", DEFAULT_PAR_TIME, warnings);
    let toolbox = get_attribute(e, "toolbox-types").unwrap_or_else(|| {
        warnings.push("level is missing 'toolbox-types', using none".to_string());
        String::new()
    });
    (attempts, par_time, toolbox)
}

/// Required numeric attribute; `None` drops the element
fn parse_coord(e: &BytesStart, element: &str, name: &str, warnings: &mut Warnings) -> Option<f32> {
    let Some(raw) = get_attribute(e, name) else {
        warnings.push(format!("<{element}> is missing '{name}', skipping it"));
        return None;
    };
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warnings.push(format!("<{element}> has invalid '{name}'=\"{raw}\", skipping it"));
            None
        }
    }
}

fn parse_position(e: &BytesStart, element: &str, warnings: &mut Warnings) -> Option<Vec2> {
    let x = parse_coord(e, element, "x", warnings)?;
    let y = parse_coord(e, element, "y", warnings)?;
    Some(Vec2::new(x, y))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_platform(e: &BytesStart, warnings: &mut Warnings) -> Option<Platform> {
    let origin = parse_position(e, "platform", warnings)?;
    let width = parse_coord(e, "platform", "width", warnings)?;
    let height = parse_coord(e, "platform", "height", warnings)?;
    let breakable = match get_attribute(e, "breakable") {
        None => false,
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            warnings.push(format!("<platform> has invalid 'breakable'=\"{raw}\", using false"));
            false
        }),
    };
    match Platform::new(origin, Vec2::new(width, height), breakable) {
        Ok(platform) => Some(platform),
        Err(err) => {
            warnings.push(format!("skipping <platform>: {err}"));
            None
        }
    }
}

fn push_entity<T>(
    entity: Result<T, crate::error::SimError>,
    element: &'static str,
    out: &mut Vec<T>,
    warnings: &mut Warnings,
) {
    match entity {
        Ok(entity) => out.push(entity),
        Err(err) => warnings.push(format!("skipping <{element}>: {err}")),
    }
}

/// Goal and launcher must be valid; a second one is ignored
fn set_unique<T>(
    entity: Result<T, crate::error::SimError>,
    element: &'static str,
    slot: &mut Option<T>,
    warnings: &mut Warnings,
) -> Result<(), LevelError> {
    let entity = entity.map_err(|source| LevelError::InvalidEntity { element, source })?;
    if slot.is_some() {
        warnings.push(format!("duplicate <{element}>, keeping the first"));
    } else {
        *slot = Some(entity);
    }
    Ok(())
}

fn int(v: f32) -> String {
    (v.round() as i64).to_string()
}

fn write_err(context: &str, e: impl std::fmt::Display) -> LevelError {
    LevelError::Xml(format!("failed to write {context}: {e}"))
}

fn write_positioned(
    writer: &mut Writer<Vec<u8>>,
    element: &str,
    origin: Vec2,
) -> Result<(), LevelError> {
    let mut e = BytesStart::new(element);
    e.push_attribute(("x", int(origin.x).as_str()));
    e.push_attribute(("y", int(origin.y).as_str()));
    writer
        .write_event(Event::Empty(e))
        .map_err(|err| write_err(element, err))
}

/// Serialize a level. Coordinates are written as whole pixels.
pub fn write_level(level: &Level) -> Result<String, LevelError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| write_err("XML declaration", e))?;

    let mut root = BytesStart::new("level");
    root.push_attribute(("balls", level.attempts.to_string().as_str()));
    root.push_attribute(("par-seconds", level.par_time.to_string().as_str()));
    root.push_attribute(("toolbox-types", level.toolbox_types.as_str()));
    writer
        .write_event(Event::Start(root))
        .map_err(|e| write_err("level element", e))?;

    write_positioned(&mut writer, "launcher", level.launcher.position())?;
    write_positioned(&mut writer, "goal", level.goal.origin())?;

    for platform in &level.platforms {
        let mut e = BytesStart::new("platform");
        e.push_attribute(("x", int(platform.origin().x).as_str()));
        e.push_attribute(("y", int(platform.origin().y).as_str()));
        e.push_attribute(("width", int(platform.size().x).as_str()));
        e.push_attribute(("height", int(platform.size().y).as_str()));
        e.push_attribute(("breakable", if platform.breakable { "true" } else { "false" }));
        writer
            .write_event(Event::Empty(e))
            .map_err(|err| write_err("platform", err))?;
    }
    for treasure in &level.treasures {
        write_positioned(&mut writer, "treasure", treasure.origin())?;
    }
    for trap in &level.death_traps {
        write_positioned(&mut writer, "deathtrap", trap.origin())?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("level")))
        .map_err(|e| write_err("level end", e))?;

    String::from_utf8(writer.into_inner()).map_err(|e| LevelError::Xml(e.to_string()))
}

/// Write a level file
pub fn save_level(path: impl AsRef<Path>, level: &Level) -> Result<(), LevelError> {
    let path = path.as_ref();
    let xml = write_level(level)?;
    std::fs::write(path, xml).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved level '{}' to {}", level.name, path.display());
    Ok(())
}
