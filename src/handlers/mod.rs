// handlers/mod.rs - three security tiers
//
// public:    no session (/, /health, /auth/*)
// protected: live session required (/api/*)
// elevated:  live admin session required (/api/admin/*)
pub mod elevated;
pub mod protected;
pub mod public;
