//! # Lints
//!
//! Non-fatal findings about otherwise valid documents. Lints are logged
//! as warnings and returned in the build report; they never fail a build.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// Tokens a `tms` URL must contain. `{-y}` stands in for `{y}`.
const TMS_TOKENS: [&str; 3] = ["{zoom}", "{x}", "{y}"];

/// Tokens a `wms` URL must contain.
const WMS_TOKENS: [&str; 4] = ["{proj}", "{bbox}", "{width}", "{height}"];

/// What a lint is about.
#[derive(Debug, Clone, PartialEq)]
pub enum LintKind {
    /// The URL template lacks a token its service type needs.
    MissingUrlToken {
        /// The missing token.
        token: &'static str,
    },
    /// `min_zoom` of 0 on a tile service is the default anyway.
    RedundantMinZoom,
    /// Zoom bounds have no meaning for a WMS.
    ZoomOnWms {
        /// `min_zoom` or `max_zoom`.
        field: &'static str,
    },
    /// A tile service lists projections it cannot honour.
    ProjectionsOnTms,
    /// A WMS does not list the projections it serves.
    MissingProjections,
    /// The icon is embedded as a `data:` URI.
    EmbeddedIcon {
        /// Size of the URI in bytes.
        bytes: usize,
    },
    /// A coordinate lies outside lon -180..180, lat -90..90.
    OutOfExtent {
        /// Longitude of the first offending position.
        lon: f64,
        /// Latitude of the first offending position.
        lat: f64,
    },
}

impl fmt::Display for LintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintKind::MissingUrlToken { token } => write!(f, "url is missing {token}"),
            LintKind::RedundantMinZoom => write!(f, "min_zoom of 0 is redundant"),
            LintKind::ZoomOnWms { field } => write!(f, "{field} has no effect on a wms source"),
            LintKind::ProjectionsOnTms => {
                write!(f, "available_projections has no effect on a tms source")
            }
            LintKind::MissingProjections => write!(f, "wms source lists no available_projections"),
            LintKind::EmbeddedIcon { bytes } => write!(
                f,
                "icon is embedded ({:.2} KB); link to it instead",
                *bytes as f64 / 1024.0
            ),
            LintKind::OutOfExtent { lon, lat } => {
                write!(f, "coordinate [{lon}, {lat}] is outside the EPSG:4326 extent")
            }
        }
    }
}

/// A lint raised against one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Lint {
    /// The document's file.
    pub path: PathBuf,
    /// The document's id.
    pub id: String,
    /// The finding.
    pub kind: LintKind,
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path.display(), self.id, self.kind)
    }
}

/// Lint a schema-valid resource document.
pub fn lint_resource(document: &Value) -> Vec<LintKind> {
    let mut lints = Vec::new();
    let url = document.get("url").and_then(Value::as_str).unwrap_or_default();
    match document.get("type").and_then(Value::as_str) {
        Some("tms") => {
            let url = url.replace("{-y}", "{y}");
            lints.extend(missing_tokens(&url, &TMS_TOKENS));
            if document.get("min_zoom").and_then(Value::as_u64) == Some(0) {
                lints.push(LintKind::RedundantMinZoom);
            }
            if document.get("available_projections").is_some() {
                lints.push(LintKind::ProjectionsOnTms);
            }
        }
        Some("wms") => {
            lints.extend(missing_tokens(url, &WMS_TOKENS));
            for field in ["min_zoom", "max_zoom"] {
                if document.get(field).is_some() {
                    lints.push(LintKind::ZoomOnWms { field });
                }
            }
            if document.get("available_projections").is_none() {
                lints.push(LintKind::MissingProjections);
            }
        }
        _ => {}
    }
    if let Some(icon) = document.get("icon").and_then(Value::as_str) {
        if icon.starts_with("data:") {
            lints.push(LintKind::EmbeddedIcon { bytes: icon.len() });
        }
    }
    lints
}

fn missing_tokens(url: &str, tokens: &[&'static str]) -> Vec<LintKind> {
    tokens
        .iter()
        .copied()
        .filter(|token| !url.contains(token))
        .map(|token| LintKind::MissingUrlToken { token })
        .collect()
}

/// Lint a canonicalized feature document. Reports at most one position.
pub fn lint_feature(document: &Value) -> Vec<LintKind> {
    document
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(first_out_of_extent)
        .map(|(lon, lat)| LintKind::OutOfExtent { lon, lat })
        .into_iter()
        .collect()
}

fn first_out_of_extent(node: &Value) -> Option<(f64, f64)> {
    let items = node.as_array()?;
    if let [lon, lat, ..] = items.as_slice() {
        if let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) {
            let inside = (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat);
            return (!inside).then_some((lon, lat));
        }
    }
    items.iter().find_map(first_out_of_extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tms_missing_tokens_and_redundant_min_zoom() {
        let doc = json!({"type": "tms", "url": "https://t/{zoom}/{x}.png", "min_zoom": 0});
        assert_eq!(
            lint_resource(&doc),
            vec![LintKind::MissingUrlToken { token: "{y}" }, LintKind::RedundantMinZoom]
        );
    }

    #[test]
    fn tms_accepts_flipped_y() {
        let doc = json!({"type": "tms", "url": "https://t/{zoom}/{x}/{-y}.png"});
        assert!(lint_resource(&doc).is_empty());
    }

    #[test]
    fn wms_lints() {
        let doc = json!({
            "type": "wms",
            "url": "https://w?SRS={proj}&BBOX={bbox}&WIDTH={width}",
            "max_zoom": 19
        });
        assert_eq!(
            lint_resource(&doc),
            vec![
                LintKind::MissingUrlToken { token: "{height}" },
                LintKind::ZoomOnWms { field: "max_zoom" },
                LintKind::MissingProjections,
            ]
        );
    }

    #[test]
    fn embedded_icon_reports_size() {
        let icon = "data:image/png;base64,AAAA";
        let doc = json!({"type": "bing", "url": "https://b", "icon": icon});
        assert_eq!(lint_resource(&doc), vec![LintKind::EmbeddedIcon { bytes: icon.len() }]);
        let text = LintKind::EmbeddedIcon { bytes: 2048 }.to_string();
        assert!(text.contains("2.00 KB"));
    }

    #[test]
    fn feature_outside_extent() {
        let doc = json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [181.5, 0], [0, 1], [0, 0]]]}
        });
        assert_eq!(lint_feature(&doc), vec![LintKind::OutOfExtent { lon: 181.5, lat: 0.0 }]);
    }

    #[test]
    fn feature_inside_extent_or_without_geometry() {
        let inside = json!({
            "geometry": {"type": "Polygon", "coordinates": [[[-180, -90], [180, -90], [180, 90], [-180, -90]]]}
        });
        assert!(lint_feature(&inside).is_empty());
        assert!(lint_feature(&json!({"geometry": null})).is_empty());
    }
}
