//! # Leadgate Graph
//!
//! Minimal client for the parts of the Facebook Graph API that lead ingestion
//! relies on:
//!
//! - Reading lead, form, page and ad objects (`GET /{id}?fields=...`)
//! - Listing the pages a token manages and each page's lead forms, one
//!   cursor page at a time
//! - Inspecting the token owner and the token itself (`/me`, `/debug_token`)
//! - Exchanging an OAuth2 authorization code for an access token
//!
//! The client never retries. Callers decide how to degrade when a call fails.

pub mod client;
pub mod error;
pub mod models;
pub mod token;

pub use client::{ClientConfig, ClientConfigBuilder, GraphApi, GraphClient};
pub use error::{GraphError, TokenExchangeError};
pub use models::{
    AdDetails, AdSetDetails, BusinessRef, CampaignDetails, Cursors, FieldData, FormDetails,
    LeadData, PageAccount, PageDetails, PageLocation, Paged, Paging, TokenDebugInfo, UserInfo,
};
pub use token::{parse_token_response, ExpiresIn, TokenExchanger, TokenRequest, TokenResponse};
