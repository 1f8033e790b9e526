use serde::{Deserialize, Serialize};

use crate::{errors::SGError, storage::BoundingBox};

///
/// Grid type selector: basis family, boundary treatment and B-spline degree.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridType
{
    Linear,
    LinearBoundary,
    ModLinear,
    LinearClenshawCurtis,
    LinearClenshawCurtisBoundary,
    Bspline { degree: usize },
    BsplineBoundary { degree: usize },
    NakBsplineBoundary { degree: usize },
    NakBsplineExtended { degree: usize },
}

impl GridType
{
    pub fn has_boundary(&self) -> bool
    {
        matches!(self, GridType::LinearBoundary | GridType::LinearClenshawCurtisBoundary |
            GridType::BsplineBoundary { .. } | GridType::NakBsplineBoundary { .. })
    }

    pub fn degree(&self) -> usize
    {
        match self
        {
            GridType::Bspline { degree } | GridType::BsplineBoundary { degree } |
            GridType::NakBsplineBoundary { degree } | GridType::NakBsplineExtended { degree } => *degree,
            _ => 1,
        }
    }
}

fn default_boundary_level() -> usize
{
    1
}

///
/// Everything needed to build a regular grid. Can be loaded from JSON.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig
{
    pub grid_type: GridType,
    pub dimension: usize,
    pub level: usize,
    /// Level offset of boundary points, only used for grids with boundary.
    #[serde(default = "default_boundary_level")]
    pub boundary_level: usize,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl GridConfig
{
    pub fn new(grid_type: GridType, dimension: usize, level: usize) -> Self
    {
        Self { grid_type, dimension, level, boundary_level: 1, bounding_box: None }
    }

    pub fn from_json(text: &str) -> Result<Self, SGError>
    {
        serde_json::from_str(text).map_err(|e| SGError::DeserializationFailed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SGError>
    {
        serde_json::to_string_pretty(self).map_err(|e| SGError::SerializationFailed(e.to_string()))
    }
}

#[test]
fn check_config_from_json()
{
    let text = r#"{ "grid_type": { "NakBsplineBoundary": { "degree": 3 } }, "dimension": 2, "level": 3 }"#;
    let config = GridConfig::from_json(text).expect("could not parse config");
    assert_eq!(config.grid_type, GridType::NakBsplineBoundary { degree: 3 });
    assert_eq!(config.boundary_level, 1);
    assert!(config.bounding_box.is_none());
    assert!(config.grid_type.has_boundary());
    let round = GridConfig::from_json(&config.to_json().expect("could not write config")).expect("could not parse config");
    assert_eq!(round, config);
}
