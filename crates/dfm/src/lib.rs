//! Design-for-manufacturing analyzers built on the ray engine.

pub mod accessibility;
pub mod pocket;

pub use accessibility::{
    analyze_cnc_accessibility, analyze_draft_angles, analyze_molding_accessibility,
    analyze_overhangs, compute_accessibility_scores, AccessibilityResult,
};
pub use pocket::{analyze_pockets, PocketDepthResult, PocketType};
