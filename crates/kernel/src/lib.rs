//! Analytic B-rep kernel.
//!
//! Provides the geometry and topology substrate for the analysis engine:
//! vector math, analytic surfaces and curves, an arena-backed entity
//! store with deterministic dense indexing, face tessellation with a
//! triangle-to-face map, synthetic primitive builders, and a STEP subset
//! importer. Downstream crates consume shapes through the [`SolidModel`]
//! capability trait so the kernel itself stays swappable.

pub mod geometry;
pub mod primitives;
pub mod shape;
pub mod step;
pub mod tessellation;
pub mod topology;
pub mod traits;

pub use geometry::{BoundingBox, Circle3d, Cone, Curve, Cylinder, Line3d, Plane, Point3d, Sphere, Surface, Torus, Vec3};
pub use shape::Shape;
pub use step::load_step;
pub use tessellation::TriangleMesh;
pub use topology::{Edge, SurfaceKind};
pub use traits::{midpoint_normal, KernelError, OrientedEdge, SolidModel, SurfaceSample};
