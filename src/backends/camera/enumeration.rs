// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery
//!
//! PipeWire nodes are listed through `pw-cli`. When PipeWire reports no
//! video sources, raw V4L2 capture nodes are listed instead. If neither
//! finds anything, a single "default camera" entry lets PipeWire pick.

use super::types::{BackendError, BackendResult, CameraDevice, CameraSource, SensorRotation};
use std::path::Path;
use tracing::{debug, info, warn};

/// Enumerate available cameras
///
/// Never returns an empty list; the PipeWire default entry is the last resort.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    if let Some(cameras) = enumerate_pipewire_cameras() {
        return cameras;
    }

    let cameras = enumerate_v4l2_cameras();
    if !cameras.is_empty() {
        info!(count = cameras.len(), "Enumerated cameras via V4L2");
        return cameras;
    }

    info!("Using PipeWire auto-selection (default camera)");
    vec![CameraDevice::pipewire_default()]
}

/// Pick the camera at `index` from an enumerated list
pub fn select_camera(cameras: &[CameraDevice], index: usize) -> BackendResult<&CameraDevice> {
    cameras.get(index).ok_or_else(|| {
        BackendError::DeviceNotFound(format!(
            "index {} out of range ({} camera(s) available)",
            index,
            cameras.len()
        ))
    })
}

/// Enumerate cameras using PipeWire
///
/// Returns `None` when PipeWire is unavailable or lists no video sources.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    debug!("Attempting to enumerate cameras via PipeWire");

    if gstreamer::init().is_err() {
        warn!("GStreamer init failed");
        return None;
    }

    if gstreamer::ElementFactory::make("pipewiresrc")
        .build()
        .is_err()
    {
        debug!("pipewiresrc not available");
        return None;
    }

    let output = std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .ok()?;

    if !output.status.success() {
        debug!("pw-cli command failed");
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cameras: Vec<CameraDevice> = parse_pw_cli_nodes(&stdout)
        .into_iter()
        .map(|node| {
            // pw-cli ls does not include api.libcamera.rotation
            let rotation = query_node_rotation(&node.id);
            debug!(id = %node.id, name = %node.name, path = %node.path(), %rotation, "Found video camera");
            CameraDevice {
                name: node.name.clone(),
                path: node.path(),
                source: CameraSource::PipeWire,
                rotation,
            }
        })
        .collect();

    if cameras.is_empty() {
        debug!("No cameras found via pw-cli");
        None
    } else {
        debug!(count = cameras.len(), "Enumerated cameras via pw-cli");
        Some(cameras)
    }
}

/// A video source node from `pw-cli ls Node`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeWireNode {
    pub id: String,
    pub serial: Option<String>,
    pub name: String,
}

impl PipeWireNode {
    /// Capture path; `object.serial` is preferred for the target-object property
    pub fn path(&self) -> String {
        match &self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", self.id),
        }
    }
}

/// Parse `pw-cli ls Node` output into its video source nodes
pub fn parse_pw_cli_nodes(output: &str) -> Vec<PipeWireNode> {
    #[derive(Default)]
    struct Pending {
        id: Option<String>,
        serial: Option<String>,
        name: Option<String>,
        is_video_source: bool,
    }

    impl Pending {
        fn finish(self) -> Option<PipeWireNode> {
            if !self.is_video_source {
                return None;
            }
            Some(PipeWireNode {
                id: self.id?,
                serial: self.serial,
                name: self.name?,
            })
        }
    }

    let mut nodes = Vec::new();
    let mut current = Pending::default();

    for line in output.lines() {
        let trimmed = line.trim();

        // Node header: "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            nodes.extend(std::mem::take(&mut current).finish());
            current.id = rest
                .split(',')
                .next()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty());
            continue;
        }

        if trimmed.contains("media.class") && trimmed.contains("\"Video/Source\"") {
            current.is_video_source = true;
        } else if trimmed.contains("object.serial") {
            current.serial = extract_quoted_value(trimmed);
        } else if trimmed.contains("node.description") {
            current.name = extract_quoted_value(trimmed);
        }
    }
    nodes.extend(current.finish());

    nodes
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Query rotation for a PipeWire node using `pw-cli info`
fn query_node_rotation(node_id: &str) -> SensorRotation {
    let output = match std::process::Command::new("pw-cli")
        .args(["info", node_id])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => {
            debug!(node_id, "Failed to query node info for rotation");
            return SensorRotation::default();
        }
    };

    parse_rotation(&String::from_utf8_lossy(&output.stdout))
}

/// Find `api.libcamera.rotation = "90"` in `pw-cli info` output
fn parse_rotation(info: &str) -> SensorRotation {
    info.lines()
        .map(str::trim)
        .filter(|line| line.contains("api.libcamera.rotation"))
        .find_map(extract_quoted_value)
        .map(|value| SensorRotation::from_degrees(&value))
        .unwrap_or_default()
}

/// Enumerate V4L2 video capture nodes
pub fn enumerate_v4l2_cameras() -> Vec<CameraDevice> {
    v4l::context::enum_devices()
        .into_iter()
        .filter(|node| is_capture_device(node.path()))
        .map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let name = node
                .name()
                .unwrap_or_else(|| format!("Video device {}", node.index()));
            debug!(name = %name, path = %path, "Found V4L2 capture device");
            CameraDevice {
                name,
                path,
                source: CameraSource::V4l2,
                rotation: SensorRotation::None,
            }
        })
        .collect()
}

fn is_capture_device(path: &Path) -> bool {
    let caps = v4l::Device::with_path(path).and_then(|device| device.query_caps());
    match caps {
        Ok(caps) => caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to query V4L2 capabilities");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_camera_out_of_range() {
        let cameras = vec![CameraDevice::pipewire_default()];
        assert_eq!(select_camera(&cameras, 0).ok(), Some(&cameras[0]));
        assert!(matches!(
            select_camera(&cameras, 3),
            Err(BackendError::DeviceNotFound(_))
        ));
        assert!(select_camera(&[], 0).is_err());
    }

    const PW_CLI_OUTPUT: &str = r#"
	id 31, type PipeWire:Interface:Node/3
 		object.serial = "31"
 		factory.id = "10"
 		node.description = "Built-in Audio Analog Stereo"
 		media.class = "Audio/Sink"
	id 76, type PipeWire:Interface:Node/3
 		object.serial = "2146"
 		object.path = "v4l2:/dev/video0"
 		node.description = "Integrated Camera (V4L2)"
 		media.class = "Video/Source"
	id 80, type PipeWire:Interface:Node/3
 		node.description = "USB Camera"
 		media.class = "Video/Source"
"#;

    #[test]
    fn test_parse_pw_cli_nodes_keeps_video_sources() {
        let nodes = parse_pw_cli_nodes(PW_CLI_OUTPUT);
        assert_eq!(
            nodes,
            vec![
                PipeWireNode {
                    id: "76".to_string(),
                    serial: Some("2146".to_string()),
                    name: "Integrated Camera (V4L2)".to_string(),
                },
                PipeWireNode {
                    id: "80".to_string(),
                    serial: None,
                    name: "USB Camera".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_node_path_prefers_serial() {
        let nodes = parse_pw_cli_nodes(PW_CLI_OUTPUT);
        assert_eq!(nodes[0].path(), "pipewire-serial-2146");
        assert_eq!(nodes[1].path(), "pipewire-80");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_pw_cli_nodes("").is_empty());
    }

    #[test]
    fn test_parse_rotation() {
        let info = "  * api.libcamera.rotation = \"270\"\n  * node.name = \"cam\"";
        assert_eq!(parse_rotation(info), SensorRotation::Rotate270);
        assert_eq!(parse_rotation("node.name = \"cam\""), SensorRotation::None);
    }

    #[test]
    fn test_extract_quoted_value() {
        assert_eq!(
            extract_quoted_value("node.nick = \"Webcam\""),
            Some("Webcam".to_string())
        );
        assert_eq!(extract_quoted_value("no quotes"), None);
    }
}
