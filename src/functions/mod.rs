// Operations grouped by what they compute
pub mod calculus;
pub mod derivative;
pub mod domain;
pub mod format;
pub mod integral;
pub mod mesh;
pub mod plot3d;
pub mod surface;
