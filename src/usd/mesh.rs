//! The schema-side mesh prim and its primvars.

use crate::core::{Interpolation, TimeCode, ValueArray, ValueType};
use crate::usd::Attribute;
use crate::util::Vec3;
use std::collections::BTreeMap;

/// Well-known primvar carrying explicit normals.
pub const NORMALS_PRIMVAR: &str = "normals";
/// Well-known primvar carrying display colors.
pub const DISPLAY_COLOR_PRIMVAR: &str = "displayColor";
/// Well-known primvar carrying display opacity.
pub const DISPLAY_OPACITY_PRIMVAR: &str = "displayOpacity";

/// Face winding convention of the authored topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    RightHanded,
    LeftHanded,
}

/// Subdivision scheme of the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubdivisionScheme {
    #[default]
    CatmullClark,
    Loop,
    Bilinear,
    /// Plain polygonal mesh; authored when explicit normals are exported,
    /// since subdivision would define its own.
    None,
}

/// A geometric attribute with an interpolation class and an optional index
/// array.
#[derive(Clone, Debug)]
pub struct Primvar {
    pub type_name: ValueType,
    pub interpolation: Interpolation,
    pub values: Attribute<ValueArray>,
    pub indices: Attribute<Vec<i32>>,
}

impl Primvar {
    pub fn new(type_name: ValueType, interpolation: Interpolation) -> Self {
        Self {
            type_name,
            interpolation,
            values: Attribute::new(),
            indices: Attribute::new(),
        }
    }

    /// Whether any value has been authored.
    pub fn has_value(&self) -> bool {
        self.values.has_value()
    }

    /// Whether an index array is authored at the given time.
    pub fn is_indexed(&self, time: TimeCode) -> bool {
        self.indices.get(time).map(|i| !i.is_empty()).unwrap_or(false)
    }

    /// Component count of the value type.
    pub fn dimension(&self) -> usize {
        self.type_name.dimension()
    }
}

/// A face grouping on the mesh, used for material binding.
#[derive(Clone, Debug, Default)]
pub struct GeomSubset {
    pub name: String,
    pub indices: Attribute<Vec<i32>>,
    /// Source material id carried as custom data, when known.
    pub mat_id: Option<i32>,
}

/// A mesh prim: points, face-vertex topology, crease arrays and primvars,
/// all time-sampled.
#[derive(Clone, Debug)]
pub struct UsdMesh {
    pub path: String,
    pub points: Attribute<Vec<Vec3>>,
    pub extent: Attribute<[Vec3; 2]>,
    pub face_vertex_counts: Attribute<Vec<i32>>,
    pub face_vertex_indices: Attribute<Vec<i32>>,
    pub orientation: Orientation,
    pub subdivision_scheme: SubdivisionScheme,
    /// Explicit normals as an attribute (the `normals` primvar takes
    /// precedence over this when both are present).
    pub normals: Attribute<ValueArray>,
    pub normals_interpolation: Interpolation,
    pub corner_indices: Attribute<Vec<i32>>,
    pub corner_sharpnesses: Attribute<Vec<f32>>,
    pub crease_indices: Attribute<Vec<i32>>,
    pub crease_lengths: Attribute<Vec<i32>>,
    pub crease_sharpnesses: Attribute<Vec<f32>>,
    pub primvars: BTreeMap<String, Primvar>,
    pub subsets: Vec<GeomSubset>,
    /// Source material id carried as custom data when the whole mesh uses
    /// one material.
    pub mat_id: Option<i32>,
}

impl UsdMesh {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            points: Attribute::new(),
            extent: Attribute::new(),
            face_vertex_counts: Attribute::new(),
            face_vertex_indices: Attribute::new(),
            orientation: Orientation::default(),
            subdivision_scheme: SubdivisionScheme::default(),
            normals: Attribute::new(),
            normals_interpolation: Interpolation::FaceVarying,
            corner_indices: Attribute::new(),
            corner_sharpnesses: Attribute::new(),
            crease_indices: Attribute::new(),
            crease_lengths: Attribute::new(),
            crease_sharpnesses: Attribute::new(),
            primvars: BTreeMap::new(),
            subsets: Vec::new(),
            mat_id: None,
        }
    }

    pub fn has_primvar(&self, name: &str) -> bool {
        self.primvars.contains_key(name)
    }

    pub fn primvar(&self, name: &str) -> Option<&Primvar> {
        self.primvars.get(name)
    }

    pub fn primvar_mut(&mut self, name: &str) -> Option<&mut Primvar> {
        self.primvars.get_mut(name)
    }

    /// Create a primvar, or retype an existing one.
    pub fn create_primvar(
        &mut self,
        name: &str,
        type_name: ValueType,
        interpolation: Interpolation,
    ) -> &mut Primvar {
        let primvar = self
            .primvars
            .entry(name.to_string())
            .or_insert_with(|| Primvar::new(type_name, interpolation));
        primvar.type_name = type_name;
        primvar.interpolation = interpolation;
        primvar
    }

    /// The display color primvar, if authored.
    pub fn display_color(&self) -> Option<&Primvar> {
        self.primvar(DISPLAY_COLOR_PRIMVAR)
    }

    /// Whether the mesh carries usable geometry at the given time.
    pub fn is_valid(&self, time: TimeCode) -> bool {
        let has = |a: &Attribute<Vec<i32>>| a.get(time).map(|v| !v.is_empty()).unwrap_or(false);
        self.points.get(time).map(|p| !p.is_empty()).unwrap_or(false)
            && has(&self.face_vertex_counts)
            && has(&self.face_vertex_indices)
    }
}
