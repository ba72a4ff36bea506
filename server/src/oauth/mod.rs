//! The authorization-code-with-PKCE flow against the identity provider:
//! verifier/challenge generation, the authorization redirect, the code
//! exchange, ID-token verification, and the post-verification policy.

pub mod pkce;
pub mod policy;
pub mod request;
pub mod token;
pub mod verify;
