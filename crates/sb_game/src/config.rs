//! Startup configuration: viewport, timing, phase schedule and the entity
//! template tables.
//!
//! Every field has a built-in default matching the stock game, so the JSON file
//! only needs to name what it overrides. Tables (`players`, `weapons`, `npcs`,
//! `props`, `environment_phases`) are replaced wholesale when present.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sb_core::phase::{PhaseEntry, PhaseSpeeds};
use sb_core::rect::Viewport;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/space_blasto.json";

/// sRGB color with channels in `0.0..=1.0`, parsed from `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
    }

    pub fn parse_hex(raw: &str) -> Result<Self, ConfigError> {
        let bad = || ConfigError::Color(raw.to_string());
        let hex = raw.strip_prefix('#').ok_or_else(bad)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(bad());
        }
        let mut channels = [1.0f32; 4];
        for (i, channel) in channels.iter_mut().enumerate().take(hex.len() / 2) {
            let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| bad())?;
            *channel = f32::from(byte) / 255.0;
        }
        Ok(Self(channels))
    }

    /// Channels converted for blending on an sRGB surface; alpha is unchanged.
    pub fn to_linear(self) -> [f32; 4] {
        let [r, g, b, a] = self.0;
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.to_linear();
        wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl TryFrom<String> for Rgba {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

/// How an image file becomes a sprite: source file, target size, orientation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpriteSpec {
    pub image: String,
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub resize: bool,
    pub width: u32,
    pub height: u32,
    pub color: Rgba,
}

impl SpriteSpec {
    /// Two templates share a cache entry only when they would produce the same
    /// pixels.
    pub fn cache_key(&self) -> String {
        let mut key = self.image.clone();
        if self.resize {
            key.push_str(&format!("@{}x{}", self.width, self.height));
        }
        if self.flip {
            key.push_str("#flip");
        }
        key
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityTemplate {
    pub name: String,
    #[serde(flatten)]
    pub sprite: SpriteSpec,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub direction: [f32; 2],
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub phase_speeds: Option<PhaseSpeeds>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropTemplate {
    pub name: String,
    #[serde(flatten)]
    pub sprite: SpriteSpec,
    pub x: f32,
    pub y: f32,
    pub spray_count: u32,
    pub spray_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseConfig {
    pub name: String,
    pub duration_frames: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeatballConfig {
    /// Index into `weapons`; `None` disables timed spawns.
    pub weapon_index: Option<usize>,
    pub spawn_margin: f32,
    pub spawn_min_ms: u64,
    pub spawn_range_ms: u64,
}

impl Default for MeatballConfig {
    fn default() -> Self {
        Self {
            weapon_index: Some(1),
            spawn_margin: 60.0,
            spawn_min_ms: 20,
            spawn_range_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Frames per second the loop is capped to; 0 runs uncapped.
    pub tick_rate: u32,
    pub background_color: Rgba,
    pub background_image: Option<String>,
    pub asset_dir: PathBuf,
    /// Draw flat colored rectangles instead of loading images.
    pub debug: bool,
    /// Skip clearing between frames so sprites leave trails.
    pub acid_mode: bool,
    pub show_overlay: bool,
    pub vsync: bool,
    pub laser_cooldown_ms: u64,
    pub projectile_margin: f32,
    pub player_weapon_index: usize,
    pub meatball: MeatballConfig,
    pub rng_seed: Option<u64>,
    pub environment_phases: Vec<PhaseConfig>,
    pub players: Vec<EntityTemplate>,
    pub weapons: Vec<EntityTemplate>,
    pub npcs: Vec<EntityTemplate>,
    pub props: Vec<PropTemplate>,
}

impl GameConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.screen_width as f32, self.screen_height as f32)
    }

    pub fn phase_schedule(&self) -> Result<Vec<PhaseEntry>, ConfigError> {
        self.environment_phases
            .iter()
            .map(|p| PhaseEntry::parse(&p.name, p.duration_frames).map_err(ConfigError::from))
            .collect()
    }

    /// Every sprite any template can put on screen.
    pub fn sprite_specs(&self) -> impl Iterator<Item = &SpriteSpec> {
        self.players
            .iter()
            .chain(&self.weapons)
            .chain(&self.npcs)
            .map(|t| &t.sprite)
            .chain(self.props.iter().map(|p| &p.sprite))
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads `path` when it exists, otherwise falls back to the built-in tables.
pub fn load_startup_config(path: &Path) -> Result<GameConfig, ConfigError> {
    if path.exists() {
        log::info!("Loading config from {}", path.display());
        load_config_from_path(path)
    } else {
        log::info!(
            "No config at {}, using built-in defaults",
            path.display()
        );
        let config = GameConfig::default();
        validate_config(&config)?;
        Ok(config)
    }
}

pub fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    if config.screen_width == 0 || config.screen_height == 0 {
        return Err(ConfigError::EmptyViewport {
            width: config.screen_width,
            height: config.screen_height,
        });
    }

    config.phase_schedule()?;
    if config.environment_phases.is_empty() {
        log::warn!("Environment phase schedule is empty; entities keep their base speed");
    }

    let weapon_count = config.weapons.len();
    if !config.players.is_empty() && config.player_weapon_index >= weapon_count {
        return Err(ConfigError::WeaponIndex {
            role: "player",
            index: config.player_weapon_index,
            count: weapon_count,
        });
    }
    if let Some(index) = config.meatball.weapon_index {
        if index >= weapon_count {
            return Err(ConfigError::WeaponIndex {
                role: "meatball",
                index,
                count: weapon_count,
            });
        }
    }

    validate_margin("projectile_margin", config.projectile_margin)?;
    validate_margin("meatball.spawn_margin", config.meatball.spawn_margin)?;

    let mut names = HashSet::new();
    for template in config.players.iter().chain(&config.weapons).chain(&config.npcs) {
        validate_sprite(&template.name, &template.sprite)?;
        if !names.insert(template.name.as_str()) {
            log::warn!("Template name '{}' is used more than once", template.name);
        }
    }
    for prop in &config.props {
        validate_sprite(&prop.name, &prop.sprite)?;
        if prop.spray_radius.is_nan() || prop.spray_radius < 0.0 {
            return Err(ConfigError::InvalidSprayRadius {
                name: prop.name.clone(),
                radius: prop.spray_radius,
            });
        }
    }

    Ok(())
}

fn validate_margin(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidMargin { field, value });
    }
    Ok(())
}

fn validate_sprite(name: &str, sprite: &SpriteSpec) -> Result<(), ConfigError> {
    if sprite.width == 0 || sprite.height == 0 {
        return Err(ConfigError::ZeroDimension(name.to_string()));
    }
    Ok(())
}

fn phase_speeds(peace: f32, rogue: f32, chaos: f32, frozen: f32) -> Option<PhaseSpeeds> {
    Some(PhaseSpeeds {
        peace,
        rogue,
        chaos,
        frozen,
    })
}

fn sprite(image: &str, flip: bool, resize: bool, width: u32, height: u32, color: Rgba) -> SpriteSpec {
    SpriteSpec {
        image: image.to_string(),
        flip,
        resize,
        width,
        height,
        color,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let phases = [
            ("peace", 800),
            ("rogue", 160),
            ("chaos", 400),
            ("frozen", 60),
            ("rogue", 50),
            ("frozen", 110),
        ];

        Self {
            title: "Space Blasto".to_string(),
            screen_width: 1640,
            screen_height: 860,
            tick_rate: 60,
            background_color: Rgba::from_rgb8(0x6b, 0x8e, 0x23),
            background_image: Some("lawn-bg-dark-2560x1440.jpg".to_string()),
            asset_dir: PathBuf::from("assets"),
            debug: false,
            acid_mode: false,
            show_overlay: false,
            vsync: false,
            laser_cooldown_ms: 100,
            projectile_margin: 160.0,
            player_weapon_index: 0,
            meatball: MeatballConfig::default(),
            rng_seed: None,
            environment_phases: phases
                .iter()
                .map(|&(name, duration_frames)| PhaseConfig {
                    name: name.to_string(),
                    duration_frames,
                })
                .collect(),
            players: vec![EntityTemplate {
                name: "buck".to_string(),
                sprite: sprite("rocket-200x252.png", false, true, 100, 126, Rgba::from_rgb8(0x00, 0xff, 0xff)),
                x: 890.0,
                y: 540.0,
                direction: [-0.994, -0.114],
                speed: 480.0,
                phase_speeds: phase_speeds(590.0, 1100.0, 1700.0, 2650.0),
            }],
            weapons: vec![
                EntityTemplate {
                    name: "orb".to_string(),
                    sprite: sprite("green-ball-140x140.png", false, true, 70, 70, Rgba::from_rgb8(0x00, 0xcd, 0x00)),
                    x: 890.0,
                    y: 260.0,
                    direction: [0.0, -1.0],
                    speed: 334.0,
                    phase_speeds: phase_speeds(98.0, 122.0, 840.0, 2350.0),
                },
                EntityTemplate {
                    name: "meatball".to_string(),
                    sprite: sprite("meatball-204x220.png", false, true, 102, 110, Rgba::from_rgb8(0xa5, 0x2a, 0x2a)),
                    x: 0.0,
                    y: 0.0,
                    direction: [0.0, -1.0],
                    speed: 734.0,
                    phase_speeds: phase_speeds(698.0, 822.0, 1640.0, 3350.0),
                },
            ],
            npcs: vec![
                EntityTemplate {
                    name: "red-flower-floaty".to_string(),
                    sprite: sprite("red-flower-66x64.png", false, false, 66, 64, Rgba::from_rgb8(0xff, 0x00, 0x00)),
                    x: 240.0,
                    y: 300.0,
                    direction: [-0.624, 0.782],
                    speed: 100.0,
                    phase_speeds: phase_speeds(100.0, 100.0, 350.0, 2.0),
                },
                EntityTemplate {
                    name: "red-flower-drifty".to_string(),
                    sprite: sprite("red-flower-66x64.png", true, false, 66, 64, Rgba::from_rgb8(0xff, 0x45, 0x00)),
                    x: 240.0,
                    y: 300.0,
                    direction: [0.137, -0.991],
                    speed: 100.0,
                    phase_speeds: phase_speeds(100.0, 100.0, 420.0, 3.0),
                },
                EntityTemplate {
                    name: "goldie".to_string(),
                    sprite: sprite("gold-retriever-160x142.png", true, false, 160, 142, Rgba::from_rgb8(0xff, 0xd7, 0x00)),
                    x: 500.0,
                    y: 300.0,
                    direction: [1.0, 1.0],
                    speed: 141.0,
                    phase_speeds: phase_speeds(160.0, 880.0, 1290.0, 10.0),
                },
                EntityTemplate {
                    name: "grumpy".to_string(),
                    sprite: sprite("grumpy-cat-110x120.png", true, true, 220, 240, Rgba::from_rgb8(0xff, 0xeb, 0xcd)),
                    x: 780.0,
                    y: 300.0,
                    direction: [0.261, 0.966],
                    speed: 90.0,
                    phase_speeds: phase_speeds(80.0, 50.0, 2170.0, 40.0),
                },
                EntityTemplate {
                    name: "fishy".to_string(),
                    sprite: sprite("goldfish-280x220.png", false, false, 280, 220, Rgba::from_rgb8(0xff, 0xb9, 0x0f)),
                    x: 840.0,
                    y: 300.0,
                    direction: [-0.994, -0.114],
                    speed: 80.0,
                    phase_speeds: phase_speeds(90.0, 100.0, 700.0, 2850.0),
                },
            ],
            props: vec![
                PropTemplate {
                    name: "red-flower".to_string(),
                    sprite: sprite("red-flower-66x64.png", false, false, 66, 64, Rgba::from_rgb8(0xdc, 0x14, 0x3c)),
                    x: 804.0,
                    y: 440.0,
                    spray_count: 60,
                    spray_radius: 780.0,
                },
                PropTemplate {
                    name: "blue-flower".to_string(),
                    sprite: sprite("blue-flower-160x158.png", false, false, 160, 158, Rgba::from_rgb8(0x00, 0xce, 0xd1)),
                    x: 880.0,
                    y: 360.0,
                    spray_count: 18,
                    spray_radius: 680.0,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::phase::{Phase, PhaseError};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sb_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn load_json(name_hint: &str, body: &str) -> Result<GameConfig, ConfigError> {
        let path = temp_file_path(name_hint);
        fs::write(&path, body).expect("failed to write temp config file");
        let result = load_config_from_path(&path);
        let _ = fs::remove_file(path);
        result
    }

    #[test]
    fn defaults_validate() {
        let config = GameConfig::default();
        validate_config(&config).expect("defaults should validate");
        assert_eq!(config.phase_schedule().expect("phases").len(), 6);
        assert_eq!(config.players.len(), 1);
        assert_eq!(config.weapons.len(), 2);
        assert_eq!(config.npcs.len(), 5);
        assert_eq!(config.props.len(), 2);
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = load_json("empty", "{}").expect("empty object should load");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_config_overrides_named_fields() {
        let json = r##"
        {
          "screen_width": 1280,
          "screen_height": 720,
          "debug": true,
          "background_color": "#102030",
          "environment_phases": [
            { "name": "chaos", "duration_frames": 5 },
            { "name": "peace", "duration_frames": 2 }
          ],
          "npcs": [
            {
              "name": "bouncer",
              "image": "bouncer.png",
              "width": 32,
              "height": 16,
              "color": "#ff0000",
              "x": 10.0,
              "y": 20.0,
              "direction": [1.0, 0.0],
              "speed": 50.0
            }
          ]
        }
        "##;
        let config = load_json("partial", json).expect("partial config should load");
        assert_eq!(config.viewport(), Viewport::new(1280.0, 720.0));
        assert!(config.debug);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.background_color, Rgba::from_rgb8(0x10, 0x20, 0x30));

        let schedule = config.phase_schedule().expect("phases");
        assert_eq!(schedule[0].phase, Phase::Chaos);
        assert_eq!(schedule[1].duration_frames, 2);

        let npc = &config.npcs[0];
        assert!(!npc.sprite.flip);
        assert!(!npc.sprite.resize);
        assert_eq!(npc.phase_speeds, None);
        assert_eq!(config.weapons.len(), 2);
    }

    #[test]
    fn shipped_config_matches_defaults_apart_from_debug() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../").join(DEFAULT_CONFIG_PATH);
        let mut shipped = load_config_from_path(&path).expect("shipped config should load");
        assert!(shipped.debug);
        shipped.debug = false;
        assert_eq!(shipped, GameConfig::default());
    }

    #[test]
    fn unknown_phase_name_is_fatal() {
        let json = r#"{ "environment_phases": [ { "name": "sleepy", "duration_frames": 10 } ] }"#;
        let err = load_json("bad_phase", json).expect_err("unknown phase should fail");
        assert!(matches!(
            err,
            ConfigError::Phase(PhaseError::UnknownName(ref name)) if name == "sleepy"
        ));
    }

    #[test]
    fn zero_duration_phase_is_fatal() {
        let json = r#"{ "environment_phases": [ { "name": "peace", "duration_frames": 0 } ] }"#;
        let err = load_json("zero_phase", json).expect_err("zero duration should fail");
        assert!(matches!(
            err,
            ConfigError::Phase(PhaseError::ZeroDuration(Phase::Peace))
        ));
    }

    #[test]
    fn malformed_color_is_a_parse_error() {
        let json = r#"{ "background_color": "olivedrab" }"#;
        let err = load_json("bad_color", json).expect_err("bad color should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("olivedrab"));
    }

    #[test]
    fn weapon_index_out_of_range_is_rejected() {
        let json = r#"{ "player_weapon_index": 7 }"#;
        let err = load_json("bad_weapon", json).expect_err("index should fail");
        assert!(matches!(
            err,
            ConfigError::WeaponIndex { role: "player", index: 7, count: 2 }
        ));
    }

    #[test]
    fn zero_dimension_template_is_rejected() {
        let mut config = GameConfig::default();
        config.npcs[0].sprite.width = 0;
        let err = validate_config(&config).expect_err("zero width should fail");
        assert!(matches!(err, ConfigError::ZeroDimension(ref name) if name == "red-flower-floaty"));
    }

    #[test]
    fn negative_or_nan_spray_radius_is_rejected() {
        for radius in [-1.0, f32::NAN] {
            let mut config = GameConfig::default();
            config.props[0].spray_radius = radius;
            let err = validate_config(&config).expect_err("bad radius should fail");
            assert!(
                matches!(err, ConfigError::InvalidSprayRadius { ref name, .. } if *name == config.props[0].name),
                "radius {radius} gave {err}"
            );
        }
    }

    #[test]
    fn zero_spray_radius_is_accepted() {
        let mut config = GameConfig::default();
        config.props[0].spray_radius = 0.0;
        validate_config(&config).expect("zero radius stacks props on the center");
    }

    #[test]
    fn negative_meatball_margin_fails_at_load() {
        let err = load_json(
            "meatball_margin",
            r#"{"debug":true,"meatball":{"weapon_index":1,"spawn_margin":-10.0}}"#,
        )
        .expect_err("negative margin should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidMargin { field: "meatball.spawn_margin", value } if value == -10.0
        ));
    }

    #[test]
    fn non_finite_margins_are_rejected() {
        let mut config = GameConfig::default();
        config.meatball.spawn_margin = f32::NAN;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidMargin { field: "meatball.spawn_margin", .. })
        ));

        let mut config = GameConfig::default();
        config.projectile_margin = f32::NAN;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidMargin { field: "projectile_margin", .. })
        ));

        let mut config = GameConfig::default();
        config.projectile_margin = f32::INFINITY;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn missing_file_reports_read_error() {
        let path = temp_file_path("missing");
        let err = load_config_from_path(&path).expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn startup_config_falls_back_to_defaults() {
        let path = temp_file_path("absent");
        let config = load_startup_config(&path).expect("defaults should load");
        assert_eq!(config.title, "Space Blasto");
    }

    #[test]
    fn hex_colors_parse_with_optional_alpha() {
        assert_eq!(
            Rgba::parse_hex("#ff000080").expect("rgba"),
            Rgba([1.0, 0.0, 0.0, 128.0 / 255.0])
        );
        assert_eq!(Rgba::parse_hex("#00ff00").expect("rgb"), Rgba([0.0, 1.0, 0.0, 1.0]));
        assert!(Rgba::parse_hex("00ff00").is_err());
        assert!(Rgba::parse_hex("#0f0").is_err());
        assert!(Rgba::parse_hex("#gg0000").is_err());
    }

    #[test]
    fn linear_conversion_keeps_extremes() {
        for channel in Rgba::WHITE.to_linear() {
            assert!((channel - 1.0).abs() < 1e-5);
        }
        let [r, g, b, a] = Rgba::from_rgb8(0x80, 0, 0).to_linear();
        assert!((r - 0.2158).abs() < 1e-3, "r = {r}");
        assert_eq!((g, b, a), (0.0, 0.0, 1.0));
    }

    #[test]
    fn cache_key_separates_orientation_and_size() {
        let config = GameConfig::default();
        let floaty = config.npcs[0].sprite.cache_key();
        let drifty = config.npcs[1].sprite.cache_key();
        assert_ne!(floaty, drifty);
        assert_eq!(floaty, config.props[0].sprite.cache_key());
        assert_eq!(config.npcs[3].sprite.cache_key(), "grumpy-cat-110x120.png@220x240#flip");
    }
}
