//! Port and transmission-line utilities.
//!
//! - [`cpw`]: sizing of coplanar waveguides from a target impedance.
//! - [`placement`]: placement of edge couplers along a chip boundary.

pub mod cpw;
pub mod placement;

pub use cpw::{cpw_info, cpw_spec, CpwInfo, CpwSpec, CpwStack, CpwTarget, MAX_CPW_GAP};
pub use placement::{place_edge_couplers, ChipEdge, CouplerSite, EdgeCouplerPlacement, EdgeSpacing, Side};
