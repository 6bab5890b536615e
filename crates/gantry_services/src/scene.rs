//! Scene configuration
//!
//! A scene names the window, the label font, the initial entities and the
//! runtime knobs of a simulation. Two encodings are read into the same
//! [`SceneConfig`]: a line-oriented text format and JSON.
//!
//! Text format, one directive per line, whitespace separated:
//!
//! ```text
//! # comment
//! window <w> <h> <r> <g> <b>
//! font <path.ttf> <r> <g> <b> <size>
//! entity <label> <image> <w> <h> <px> <py> <vx> <vy> <angle>
//! input <frame> <quit|escape|pause>
//! set <max_sweeps|framerate|timer_reset_ms|threaded> <value>
//! ```
//!
//! `window` must come first and `font` before any `entity`. A malformed
//! `entity` line is logged and skipped; every other problem is an error.

use crate::input::{InputEvent, ScriptedInput};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::{FromStr, SplitWhitespace};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: unable to parse {what}")]
    Malformed { line: usize, what: &'static str },

    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: {directive} appears more than once")]
    Duplicate { line: usize, directive: &'static str },

    #[error("line {line}: {directive} appears before {required}")]
    OutOfOrder {
        line: usize,
        directive: &'static str,
        required: &'static str,
    },

    #[error("invalid window dimensions {width}x{height}")]
    InvalidWindow { width: i64, height: i64 },

    #[error("invalid RGB color (hues must be within 0-255)")]
    InvalidColor,

    #[error("invalid font size {0}")]
    InvalidFontSize(i64),

    #[error("invalid font file path {0}")]
    InvalidFontPath(PathBuf),

    #[error("line {line}: unknown setting `{key}`")]
    UnknownSetting { line: usize, key: String },

    #[error("scene has no window")]
    MissingWindow,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub color: Color,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub label: String,
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub angle: f64,
}

/// Runtime knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Stop after this many sweeps; run until asked to quit if unset.
    #[serde(default)]
    pub max_sweeps: Option<u64>,
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    #[serde(default = "default_timer_reset_ms")]
    pub timer_reset_ms: u64,
    /// Run the sweep loop on a background worker thread.
    #[serde(default)]
    pub threaded: bool,
}

fn default_framerate() -> u32 {
    60
}

fn default_timer_reset_ms() -> u64 {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_sweeps: None,
            framerate: default_framerate(),
            timer_reset_ms: default_timer_reset_ms(),
            threaded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub window: WindowConfig,
    #[serde(default)]
    pub font: Option<FontConfig>,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub input: Vec<ScriptedInput>,
}

impl SceneConfig {
    /// Load a scene file. `*.json` files are read as JSON, anything else as
    /// the text format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        let scene = if is_json {
            Self::from_json(&source)?
        } else {
            Self::from_text(&source)?
        };

        debug!(
            path = %path.display(),
            entities = scene.entities.len(),
            "scene loaded"
        );
        Ok(scene)
    }

    pub fn from_json(source: &str) -> Result<Self, SceneError> {
        let mut scene: SceneConfig = serde_json::from_str(source)?;
        if let Some(font) = &scene.font {
            check_font_path(&font.path)?;
        }
        scene.entities.retain(|entity| {
            let valid = entity.width > 0 && entity.height > 0;
            if !valid {
                warn!(label = %entity.label, "skipping entity with non-positive size");
            }
            valid
        });
        Ok(scene)
    }

    pub fn from_text(source: &str) -> Result<Self, SceneError> {
        let mut window: Option<WindowConfig> = None;
        let mut font: Option<FontConfig> = None;
        let mut entities = Vec::new();
        let mut settings = Settings::default();
        let mut input = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let content = raw.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let mut fields = Fields::new(content, line);
            let directive = fields.word("directive")?;

            match directive {
                "window" => {
                    if window.is_some() {
                        return Err(SceneError::Duplicate {
                            line,
                            directive: "window",
                        });
                    }
                    window = Some(parse_window(&mut fields)?);
                }
                "font" => {
                    if font.is_some() {
                        return Err(SceneError::Duplicate {
                            line,
                            directive: "font",
                        });
                    }
                    if window.is_none() {
                        return Err(SceneError::OutOfOrder {
                            line,
                            directive: "font",
                            required: "window",
                        });
                    }
                    font = Some(parse_font(&mut fields)?);
                }
                "entity" => {
                    if window.is_none() {
                        return Err(SceneError::OutOfOrder {
                            line,
                            directive: "entity",
                            required: "window",
                        });
                    }
                    if font.is_none() {
                        return Err(SceneError::OutOfOrder {
                            line,
                            directive: "entity",
                            required: "font",
                        });
                    }
                    match parse_entity(&mut fields) {
                        Ok(entity) => entities.push(entity),
                        Err(error) => warn!(line, %error, "unable to load entity"),
                    }
                }
                "input" => {
                    let frame = fields.number::<u64>("input frame")?;
                    let event = InputEvent::parse(fields.word("input event")?)
                        .ok_or(SceneError::Malformed {
                            line,
                            what: "input event",
                        })?;
                    input.push(ScriptedInput { frame, event });
                }
                "set" => parse_setting(&mut fields, &mut settings)?,
                other => {
                    return Err(SceneError::UnknownDirective {
                        line,
                        directive: other.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            window: window.ok_or(SceneError::MissingWindow)?,
            font,
            entities,
            settings,
            input,
        })
    }
}

/// Whitespace-separated fields of one scene line.
struct Fields<'a> {
    words: SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Fields<'a> {
    fn new(content: &'a str, line: usize) -> Self {
        Self {
            words: content.split_whitespace(),
            line,
        }
    }

    fn word(&mut self, what: &'static str) -> Result<&'a str, SceneError> {
        self.words.next().ok_or(SceneError::Malformed {
            line: self.line,
            what,
        })
    }

    fn number<T: FromStr>(&mut self, what: &'static str) -> Result<T, SceneError> {
        self.word(what)?.parse().map_err(|_| SceneError::Malformed {
            line: self.line,
            what,
        })
    }

    fn color(&mut self) -> Result<Color, SceneError> {
        let r = self.number::<i64>("red hue")?;
        let g = self.number::<i64>("green hue")?;
        let b = self.number::<i64>("blue hue")?;
        let hue = |value: i64| u8::try_from(value).map_err(|_| SceneError::InvalidColor);
        Ok(Color::new(hue(r)?, hue(g)?, hue(b)?))
    }
}

fn parse_window(fields: &mut Fields<'_>) -> Result<WindowConfig, SceneError> {
    let width = fields.number::<i64>("window width")?;
    let height = fields.number::<i64>("window height")?;
    let background = fields.color()?;

    let invalid = || SceneError::InvalidWindow { width, height };
    Ok(WindowConfig {
        width: u32::try_from(width).map_err(|_| invalid())?,
        height: u32::try_from(height).map_err(|_| invalid())?,
        background,
    })
}

fn parse_font(fields: &mut Fields<'_>) -> Result<FontConfig, SceneError> {
    let path = PathBuf::from(fields.word("font path")?);
    let color = fields.color()?;
    let size = fields.number::<i64>("font size")?;

    let size = u32::try_from(size).map_err(|_| SceneError::InvalidFontSize(size))?;
    check_font_path(&path)?;
    Ok(FontConfig { path, color, size })
}

fn parse_entity(fields: &mut Fields<'_>) -> Result<EntityConfig, SceneError> {
    let label = fields.word("entity text tag")?.to_string();
    let image = PathBuf::from(fields.word("entity image path")?);
    let width = fields.number::<i64>("entity width")?;
    let height = fields.number::<i64>("entity height")?;
    let x = fields.number::<f64>("entity x coord")?;
    let y = fields.number::<f64>("entity y coord")?;
    let vx = fields.number::<f64>("entity x velocity")?;
    let vy = fields.number::<f64>("entity y velocity")?;
    let angle = fields.number::<f64>("entity angle of rotation")?;

    let size = |value: i64| {
        u32::try_from(value)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(SceneError::Malformed {
                line: fields.line,
                what: "entity size (must be positive)",
            })
    };

    Ok(EntityConfig {
        label,
        image,
        width: size(width)?,
        height: size(height)?,
        x,
        y,
        vx,
        vy,
        angle,
    })
}

fn parse_setting(fields: &mut Fields<'_>, settings: &mut Settings) -> Result<(), SceneError> {
    let key = fields.word("setting name")?;
    match key {
        "max_sweeps" => settings.max_sweeps = Some(fields.number("max_sweeps")?),
        "framerate" => settings.framerate = fields.number("framerate")?,
        "timer_reset_ms" => settings.timer_reset_ms = fields.number("timer_reset_ms")?,
        "threaded" => settings.threaded = fields.number("threaded")?,
        other => {
            return Err(SceneError::UnknownSetting {
                line: fields.line,
                key: other.to_string(),
            })
        }
    }
    Ok(())
}

fn check_font_path(path: &Path) -> Result<(), SceneError> {
    let is_ttf = path.file_name().is_some()
        && path
            .extension()
            .is_some_and(|extension| extension == "ttf");
    if is_ttf {
        Ok(())
    } else {
        Err(SceneError::InvalidFontPath(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = "\
# demo
window 800 600 10 20 30
font fonts/mono.ttf 255 255 255 12

entity ship art/ship.png 40 20 100 100 5 -5 30
entity rock art/rock.png 0 20 10 10 0 0 0
entity comet art/comet.png 16 16 200 50 -3 2 400.5
input 10 pause
set max_sweeps 500
set threaded true
";

    #[test]
    fn parses_text_scene() {
        let scene = SceneConfig::from_text(SCENE).unwrap();

        assert_eq!(
            scene.window,
            WindowConfig {
                width: 800,
                height: 600,
                background: Color::new(10, 20, 30),
            }
        );
        assert_eq!(scene.font.as_ref().map(|font| font.size), Some(12));
        assert_eq!(scene.entities.len(), 2, "zero-width rock is skipped");
        assert_eq!(scene.entities[0].label, "ship");
        assert_eq!(scene.entities[1].angle, 400.5);
        assert_eq!(scene.settings.max_sweeps, Some(500));
        assert_eq!(scene.settings.framerate, 60);
        assert!(scene.settings.threaded);
        assert_eq!(
            scene.input,
            vec![ScriptedInput {
                frame: 10,
                event: InputEvent::TogglePause
            }]
        );
    }

    #[test]
    fn rejects_out_of_order_directives() {
        let err = SceneConfig::from_text("font a.ttf 0 0 0 10\n").unwrap_err();
        assert!(matches!(
            err,
            SceneError::OutOfOrder {
                line: 1,
                directive: "font",
                required: "window"
            }
        ));

        let err = SceneConfig::from_text("window 1 1 0 0 0\nentity a b 1 1 0 0 0 0 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::OutOfOrder {
                line: 2,
                required: "font",
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicates_and_unknown_directives() {
        let err = SceneConfig::from_text("window 1 1 0 0 0\nwindow 1 1 0 0 0\n").unwrap_err();
        assert!(matches!(err, SceneError::Duplicate { line: 2, .. }));

        let err = SceneConfig::from_text("window 1 1 0 0 0\nsprite x\n").unwrap_err();
        assert!(matches!(err, SceneError::UnknownDirective { line: 2, .. }));
    }

    #[test]
    fn validates_window_and_font() {
        assert!(matches!(
            SceneConfig::from_text("window -1 10 0 0 0"),
            Err(SceneError::InvalidWindow { width: -1, .. })
        ));
        assert!(matches!(
            SceneConfig::from_text("window 10 10 0 256 0"),
            Err(SceneError::InvalidColor)
        ));
        assert!(matches!(
            SceneConfig::from_text("window 10 10 0 0 0\nfont mono.otf 0 0 0 10"),
            Err(SceneError::InvalidFontPath(_))
        ));
        assert!(matches!(
            SceneConfig::from_text("window 10 10 0 0 0\nfont mono.ttf 0 0 0 -2"),
            Err(SceneError::InvalidFontSize(-2))
        ));
        assert!(matches!(
            SceneConfig::from_text("window 10 ten 0 0 0"),
            Err(SceneError::Malformed {
                line: 1,
                what: "window height"
            })
        ));
        assert!(matches!(
            SceneConfig::from_text("# nothing here\n"),
            Err(SceneError::MissingWindow)
        ));
    }

    #[test]
    fn parses_json_scene_with_defaults() {
        let scene = SceneConfig::from_json(
            r#"{
                "window": { "width": 320, "height": 240 },
                "font": { "path": "fonts/mono.ttf", "size": 8 },
                "entities": [
                    { "label": "a", "image": "a.png", "width": 4, "height": 4, "x": 1, "y": 2 },
                    { "label": "b", "image": "b.png", "width": 0, "height": 4, "x": 1, "y": 2 }
                ],
                "settings": { "max_sweeps": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(scene.window.background, Color::default());
        assert_eq!(scene.entities.len(), 1);
        assert_eq!(scene.entities[0].vx, 0.0);
        assert_eq!(scene.settings.max_sweeps, Some(3));
        assert_eq!(scene.settings.timer_reset_ms, 1000);
        assert!(scene.input.is_empty());
    }

    #[test]
    fn json_font_path_is_checked() {
        let result = SceneConfig::from_json(
            r#"{ "window": { "width": 1, "height": 1 }, "font": { "path": "x.woff", "size": 8 } }"#,
        );
        assert!(matches!(result, Err(SceneError::InvalidFontPath(_))));
    }

    #[test]
    fn load_reports_missing_files() {
        let result = SceneConfig::load("does/not/exist.scene");
        assert!(matches!(result, Err(SceneError::Io { .. })));
    }
}
