use std::ops::BitOr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use glam::Vec3;
use parking_lot::RwLock;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::scripting::writer::{member_call, Arg};

/// Options applied while building a scene from its source file.
/// A load-time concern only; flags are not part of the saved config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneBuildFlags(pub u32);

impl SceneBuildFlags {
    pub const DEFAULT: Self = Self(0);
    pub const DONT_MERGE_MATERIALS: Self = Self(1 << 0);
    pub const USE_ORIGINAL_TANGENTS: Self = Self(1 << 1);
    pub const ASSUME_STATIC: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SceneBuildFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Scene object as described by the authoring tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            mesh: None,
            color: default_color(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            fov: default_fov(),
            intensity: default_intensity(),
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    45.0
}

fn default_intensity() -> f32 {
    1.0
}

/// Light extracted from the scene object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug)]
struct SceneState {
    filename: String,
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
    env_map: Option<String>,
    active_camera: usize,
    build_flags: SceneBuildFlags,
}

/// Shared handle to the loaded scene.
///
/// Beyond the parsed object list, the handle carries what the snapshot
/// subsystem needs: the source filename for a round-trip reload and a
/// script fragment describing post-load state (environment map, camera
/// selection).
#[derive(Debug)]
pub struct Scene {
    inner: Arc<RwLock<SceneState>>,
}

impl Clone for Scene {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Scene {
    /// Parses the scene XML produced by the authoring tools.
    pub fn from_xml(
        xml: &str,
        filename: impl Into<String>,
        build_flags: SceneBuildFlags,
    ) -> anyhow::Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let mut object = SceneObject::default();
            object.name = required_text(&node, "name")?;
            object.object_type = optional_text(&node, "type").unwrap_or_else(|| "mesh".to_string());
            object.mesh = optional_text(&node, "mesh");
            object.color = parse_color(optional_text(&node, "color"), object.color)?;
            object.position = parse_vec3(optional_text(&node, "position"), object.position)?;
            object.rotation = parse_vec3(optional_text(&node, "rotation"), object.rotation)?;
            object.scale = parse_vec3(optional_text(&node, "scale"), object.scale)?;
            object.fov = parse_f32(optional_text(&node, "fov"), object.fov)?;
            object.intensity = parse_f32(optional_text(&node, "intensity"), object.intensity)?;
            objects.push(object);
        }

        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(|obj| Light {
                position: obj.position,
                color: obj.color,
                intensity: obj.intensity,
            })
            .collect();

        Ok(Self {
            inner: Arc::new(RwLock::new(SceneState {
                filename: filename.into(),
                objects,
                lights,
                env_map: None,
                active_camera: 0,
                build_flags,
            })),
        })
    }

    /// Reads and parses a scene file; `path` becomes the reload source.
    pub fn from_file(path: &str, build_flags: SceneBuildFlags) -> anyhow::Result<Self> {
        let xml = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("failed to read {path}: {err}"))?;
        Self::from_xml(&xml, path, build_flags)
    }

    /// Source filename used to reload the scene on replay.
    pub fn filename(&self) -> String {
        self.inner.read().filename.clone()
    }

    pub fn objects(&self) -> Vec<SceneObject> {
        self.inner.read().objects.clone()
    }

    pub fn lights(&self) -> Vec<Light> {
        self.inner.read().lights.clone()
    }

    pub fn build_flags(&self) -> SceneBuildFlags {
        self.inner.read().build_flags
    }

    pub fn env_map(&self) -> Option<String> {
        self.inner.read().env_map.clone()
    }

    pub fn set_env_map(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(EngineError::validation(
                "environment map filename must not be empty",
            ));
        }
        self.inner.write().env_map = Some(path.to_string());
        Ok(())
    }

    /// Names of camera objects, in scene order.
    pub fn cameras(&self) -> Vec<String> {
        self.inner
            .read()
            .objects
            .iter()
            .filter(|obj| obj.object_type == "camera")
            .map(|obj| obj.name.clone())
            .collect()
    }

    pub fn active_camera(&self) -> usize {
        self.inner.read().active_camera
    }

    pub fn select_camera(&self, index: usize) -> Result<()> {
        let cameras = self.cameras();
        if index >= cameras.len() {
            return Err(EngineError::validation(format!(
                "camera index {index} out of range ({} cameras)",
                cameras.len()
            )));
        }
        self.inner.write().active_camera = index;
        Ok(())
    }

    /// Cycles to the next camera and returns its name.
    pub fn next_camera(&self) -> Result<String> {
        let cameras = self.cameras();
        if cameras.is_empty() {
            return Err(EngineError::validation("scene has no cameras"));
        }
        let mut state = self.inner.write();
        state.active_camera = (state.active_camera + 1) % cameras.len();
        Ok(cameras[state.active_camera].clone())
    }

    /// Script fragment reproducing post-load scene state under `var`.
    /// Empty when everything is still at its loaded defaults.
    pub fn script(&self, var: &str) -> Result<String> {
        let state = self.inner.read();
        let mut script = String::new();
        if let Some(env_map) = &state.env_map {
            script.push_str(&member_call(var, "setEnvMap", &[Arg::new(env_map.as_str())])?);
        }
        if state.active_camera != 0 {
            script.push_str(&member_call(
                var,
                "selectCamera",
                &[Arg::new(state.active_camera)],
            )?);
        }
        Ok(script)
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> anyhow::Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> anyhow::Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_color(value: Option<String>, default: Vec3) -> anyhow::Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let r = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let g = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let b = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0))
}

fn parse_f32(value: Option<String>, default: f32) -> anyhow::Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <object>
            <name>MainCamera</name>
            <type>camera</type>
            <fov>90</fov>
        </object>
        <object>
            <name>DetailCamera</name>
            <type>camera</type>
        </object>
        <object>
            <name>KeyLight</name>
            <type>light</type>
            <intensity>2.5</intensity>
            <position>0 5 0</position>
            <color>255 128 0</color>
        </object>
    </scene>
    "#;

    fn sample_scene() -> Scene {
        Scene::from_xml(SAMPLE, "media/sample.xml", SceneBuildFlags::DEFAULT).unwrap()
    }

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = sample_scene();
        let objects = scene.objects();
        assert_eq!(objects.len(), 3);
        let camera = objects.iter().find(|o| o.name == "MainCamera").unwrap();
        assert_eq!(camera.object_type, "camera");
        assert_eq!(camera.fov, 90.0);
        assert_eq!(scene.lights().len(), 1);
        let light = scene.lights()[0];
        assert_eq!(light.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((light.intensity - 2.5).abs() < f32::EPSILON);
        assert_eq!(light.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(scene.filename(), "media/sample.xml");
        assert_eq!(scene.build_flags(), SceneBuildFlags::DEFAULT);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>mesh</type></object></scene>";
        assert!(Scene::from_xml(bad, "bad.xml", SceneBuildFlags::DEFAULT).is_err());
    }

    #[test]
    fn camera_cycling_wraps_around() {
        let scene = sample_scene();
        assert_eq!(scene.cameras(), vec!["MainCamera", "DetailCamera"]);
        assert_eq!(scene.next_camera().unwrap(), "DetailCamera");
        assert_eq!(scene.next_camera().unwrap(), "MainCamera");
    }

    #[test]
    fn select_camera_checks_bounds() {
        let scene = sample_scene();
        scene.select_camera(1).unwrap();
        assert_eq!(scene.active_camera(), 1);
        assert!(scene.select_camera(2).is_err());
    }

    #[test]
    fn script_is_empty_at_loaded_defaults() {
        assert_eq!(sample_scene().script("r.scene").unwrap(), "");
    }

    #[test]
    fn script_reproduces_env_map_and_camera() {
        let scene = sample_scene();
        scene.set_env_map("media/sky.hdr").unwrap();
        scene.select_camera(1).unwrap();
        assert_eq!(
            scene.script("r.scene").unwrap(),
            "r.scene.setEnvMap(\"media/sky.hdr\")\nr.scene.selectCamera(1)\n"
        );
    }

    #[test]
    fn build_flags_compose() {
        let flags = SceneBuildFlags::DONT_MERGE_MATERIALS | SceneBuildFlags::ASSUME_STATIC;
        assert!(flags.contains(SceneBuildFlags::ASSUME_STATIC));
        assert!(!flags.contains(SceneBuildFlags::USE_ORIGINAL_TANGENTS));
    }
}
