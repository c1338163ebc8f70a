//! Body reshaping for forwarded requests: the datamap-driven field mapper
//! and the ordered egress transforms applied after it.

mod egress;
mod mapper;

pub use egress::apply_egress;
pub use mapper::apply_mapping;
