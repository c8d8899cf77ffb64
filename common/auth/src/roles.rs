pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_SALES: &str = "Sales";

/// Role claim type emitted by WS-Federation / ASP.NET identity token issuers.
pub const ROLE_CLAIM_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
