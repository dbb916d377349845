//! roadhopper-export: Pure format serializers (sans-IO)
//!
//! Converts routes, bends and road signs into output formats.
//! Currently supports GeoJSON.

pub mod geojson;

pub use crate::geojson::{
    bend_feature, route_features, sign_feature, to_feature_collection, to_geojson_string,
};

/// Errors that can occur while encoding a route.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A feature could not be assembled from its JSON form.
    #[error("invalid GeoJSON feature: {0}")]
    GeoJson(String),

    /// Serializing the finished document failed.
    #[error("failed to serialize GeoJSON: {0}")]
    Serialize(#[from] serde_json::Error),
}
