//! Typed primvar value storage.
//!
//! [`ValueType`] names the schema value type of a primvar (including role
//! types like texture coordinates and colors, in float, double and half
//! precision). [`ValueArray`] holds the actual flat values.

use crate::util::{Vec2, Vec3, Vec4, DVec2, DVec3};
use half::f16;
use serde::{Deserialize, Serialize};

/// Schema value type of a primvar.
///
/// The role (texcoord / color / plain) matters for channel resolution on
/// import; the dimension matters for data conversion in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Float,
    Float2,
    Float3,
    Float4,
    Double2,
    Double3,
    Half2,
    Half3,
    TexCoord2f,
    TexCoord2d,
    TexCoord2h,
    TexCoord3f,
    TexCoord3d,
    TexCoord3h,
    Color3f,
    Color3d,
    Color3h,
    Color4f,
    Normal3f,
    String,
}

impl ValueType {
    /// Number of scalar components per element. Non-numeric types report 0.
    pub fn dimension(&self) -> usize {
        match self {
            Self::Float => 1,
            Self::Float2 | Self::Double2 | Self::Half2 => 2,
            Self::TexCoord2f | Self::TexCoord2d | Self::TexCoord2h => 2,
            Self::Float3 | Self::Double3 | Self::Half3 => 3,
            Self::TexCoord3f | Self::TexCoord3d | Self::TexCoord3h => 3,
            Self::Color3f | Self::Color3d | Self::Color3h | Self::Normal3f => 3,
            Self::Float4 | Self::Color4f => 4,
            Self::String => 0,
        }
    }

    /// Whether values of this type can be loaded into a float map channel.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::String)
    }

    /// Whether this is a texture-coordinate role type.
    #[inline]
    pub fn is_texcoord(&self) -> bool {
        matches!(
            self,
            Self::TexCoord2f
                | Self::TexCoord2d
                | Self::TexCoord2h
                | Self::TexCoord3f
                | Self::TexCoord3d
                | Self::TexCoord3h
        )
    }

    /// Whether this is a 3-component color role type.
    #[inline]
    pub fn is_color3(&self) -> bool {
        matches!(self, Self::Color3f | Self::Color3d | Self::Color3h)
    }

    /// Returns a type equivalent to this one for the given dimension. For
    /// example the equivalent of `TexCoord2f` in 3 dimensions is
    /// `TexCoord3f`. When no direct equivalent exists the result is a plain
    /// float array of the requested dimension; unknown types fall back to
    /// `Float3`. The dimension is clamped into `[1, 3]`.
    pub fn equivalent_for_dimension(&self, dimension: usize) -> Self {
        let table: [Self; 3] = match self {
            Self::Float | Self::Float2 | Self::Float3 => {
                [Self::Float, Self::Float2, Self::Float3]
            }
            Self::TexCoord2f | Self::TexCoord3f => {
                [Self::Float, Self::TexCoord2f, Self::TexCoord3f]
            }
            Self::Color3f => [Self::Float, Self::Float2, Self::Color3f],
            _ => [Self::Float, Self::Float2, Self::Float3],
        };
        table[dimension.clamp(1, 3) - 1]
    }

    /// Schema type name, for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float[]",
            Self::Float2 => "float2[]",
            Self::Float3 => "float3[]",
            Self::Float4 => "float4[]",
            Self::Double2 => "double2[]",
            Self::Double3 => "double3[]",
            Self::Half2 => "half2[]",
            Self::Half3 => "half3[]",
            Self::TexCoord2f => "texCoord2f[]",
            Self::TexCoord2d => "texCoord2d[]",
            Self::TexCoord2h => "texCoord2h[]",
            Self::TexCoord3f => "texCoord3f[]",
            Self::TexCoord3d => "texCoord3d[]",
            Self::TexCoord3h => "texCoord3h[]",
            Self::Color3f => "color3f[]",
            Self::Color3d => "color3d[]",
            Self::Color3h => "color3h[]",
            Self::Color4f => "color4f[]",
            Self::Normal3f => "normal3f[]",
            Self::String => "string[]",
        }
    }
}

/// Flat primvar value storage.
///
/// Each variant is one storage layout; the role lives on the owning
/// primvar's [`ValueType`]. Half and double variants exist because the
/// resolution priority table distinguishes them on import.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueArray {
    Float(Vec<f32>),
    Float2(Vec<Vec2>),
    Float3(Vec<Vec3>),
    Float4(Vec<Vec4>),
    Double2(Vec<DVec2>),
    Double3(Vec<DVec3>),
    Half2(Vec<[f16; 2]>),
    Half3(Vec<[f16; 3]>),
    String(Vec<String>),
}

impl ValueArray {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Float2(v) => v.len(),
            Self::Float3(v) => v.len(),
            Self::Float4(v) => v.len(),
            Self::Double2(v) => v.len(),
            Self::Double3(v) => v.len(),
            Self::Half2(v) => v.len(),
            Self::Half3(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether values can be cast to floats.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::String(_))
    }

    /// Number of scalar components per element. Non-numeric storage
    /// reports 0.
    pub fn dimension(&self) -> usize {
        match self {
            Self::Float(_) => 1,
            Self::Float2(_) | Self::Double2(_) | Self::Half2(_) => 2,
            Self::Float3(_) | Self::Double3(_) | Self::Half3(_) => 3,
            Self::Float4(_) => 4,
            Self::String(_) => 0,
        }
    }

    /// Element `i` as a 3-float point: extra components are truncated,
    /// missing ones zero-filled. `None` for non-numeric storage or an
    /// out-of-range index.
    pub fn get_point(&self, i: usize) -> Option<Vec3> {
        match self {
            Self::Float(v) => v.get(i).map(|&x| Vec3::new(x, 0.0, 0.0)),
            Self::Float2(v) => v.get(i).map(|p| Vec3::new(p.x, p.y, 0.0)),
            Self::Float3(v) => v.get(i).copied(),
            Self::Float4(v) => v.get(i).map(|p| Vec3::new(p.x, p.y, p.z)),
            Self::Double2(v) => v.get(i).map(|p| Vec3::new(p.x as f32, p.y as f32, 0.0)),
            Self::Double3(v) => v.get(i).map(|p| p.as_vec3()),
            Self::Half2(v) => v.get(i).map(|p| Vec3::new(p[0].to_f32(), p[1].to_f32(), 0.0)),
            Self::Half3(v) => {
                v.get(i).map(|p| Vec3::new(p[0].to_f32(), p[1].to_f32(), p[2].to_f32()))
            }
            Self::String(_) => None,
        }
    }

    /// Build from 3-float points at the given dimension (clamped to
    /// `[1, 3]`): 1 keeps x, 2 keeps xy, 3 keeps xyz.
    pub fn from_points(points: &[Vec3], dimension: usize) -> Self {
        match dimension.clamp(1, 3) {
            1 => Self::Float(points.iter().map(|p| p.x).collect()),
            2 => Self::Float2(points.iter().map(|p| Vec2::new(p.x, p.y)).collect()),
            _ => Self::Float3(points.to_vec()),
        }
    }

    /// Flat f32 view of the raw storage, converting precision where needed.
    /// `None` for non-numeric storage.
    pub fn as_flat_f32(&self) -> Option<Vec<f32>> {
        match self {
            Self::Float(v) => Some(v.clone()),
            Self::Float2(v) => Some(bytemuck::cast_slice::<Vec2, f32>(v).to_vec()),
            Self::Float3(v) => Some(bytemuck::cast_slice::<Vec3, f32>(v).to_vec()),
            Self::Float4(v) => Some(bytemuck::cast_slice::<Vec4, f32>(v).to_vec()),
            Self::Double2(v) => {
                Some(v.iter().flat_map(|p| [p.x as f32, p.y as f32]).collect())
            }
            Self::Double3(v) => {
                Some(v.iter().flat_map(|p| [p.x as f32, p.y as f32, p.z as f32]).collect())
            }
            Self::Half2(v) => {
                Some(v.iter().flat_map(|p| [p[0].to_f32(), p[1].to_f32()]).collect())
            }
            Self::Half3(v) => Some(
                v.iter()
                    .flat_map(|p| [p[0].to_f32(), p[1].to_f32(), p[2].to_f32()])
                    .collect(),
            ),
            Self::String(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        assert_eq!(ValueType::Float.dimension(), 1);
        assert_eq!(ValueType::TexCoord2h.dimension(), 2);
        assert_eq!(ValueType::Color3d.dimension(), 3);
        assert_eq!(ValueType::Color4f.dimension(), 4);
        assert_eq!(ValueType::String.dimension(), 0);
    }

    #[test]
    fn test_equivalent_types() {
        assert_eq!(
            ValueType::TexCoord2f.equivalent_for_dimension(3),
            ValueType::TexCoord3f
        );
        assert_eq!(ValueType::TexCoord3f.equivalent_for_dimension(1), ValueType::Float);
        assert_eq!(ValueType::Color3f.equivalent_for_dimension(2), ValueType::Float2);
        assert_eq!(ValueType::Float.equivalent_for_dimension(3), ValueType::Float3);
        // Unknown row falls back to plain float arrays.
        assert_eq!(ValueType::Color4f.equivalent_for_dimension(2), ValueType::Float2);
        // Out-of-range dimensions clamp.
        assert_eq!(ValueType::Float.equivalent_for_dimension(0), ValueType::Float);
        assert_eq!(ValueType::Float.equivalent_for_dimension(9), ValueType::Float3);
    }

    #[test]
    fn test_get_point_padding() {
        let a = ValueArray::Float(vec![1.5]);
        assert_eq!(a.get_point(0), Some(Vec3::new(1.5, 0.0, 0.0)));

        let a = ValueArray::Float4(vec![Vec4::new(1.0, 2.0, 3.0, 4.0)]);
        assert_eq!(a.get_point(0), Some(Vec3::new(1.0, 2.0, 3.0)));

        let a = ValueArray::Half2(vec![[f16::from_f32(0.5), f16::from_f32(0.25)]]);
        assert_eq!(a.get_point(0), Some(Vec3::new(0.5, 0.25, 0.0)));

        let a = ValueArray::String(vec!["x".into()]);
        assert_eq!(a.get_point(0), None);
        assert!(!a.is_numeric());
    }

    #[test]
    fn test_flat_f32() {
        let a = ValueArray::Float2(vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(a.as_flat_f32().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(ValueArray::String(vec![]).as_flat_f32().is_none());
    }
}
