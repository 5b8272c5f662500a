// MomCare API lib.rs
//
// HTTP surface of the MomCare backend: routes, handlers, wire types and the
// OpenAPI document. Business rules live in `mom_care_domain`.

pub mod api;
pub mod entities;
pub mod openapi;
