pub mod bbox;
pub mod curves;
pub mod point;
pub mod surfaces;
pub mod vector;

pub use bbox::BoundingBox;
pub use curves::{Circle3d, Curve, Line3d};
pub use point::Point3d;
pub use surfaces::{Cone, Cylinder, Plane, Sphere, Surface, Torus};
pub use vector::Vec3;
