//! OpenID 2.0 protocol constants.

/// Default discovery document location (Google's OpenID 2.0 XRDS endpoint)
pub const DEFAULT_DISCOVERY_URL: &str = "https://www.google.com/accounts/o8/id";

/// Default number of response nonces remembered for replay detection
pub const DEFAULT_NONCE_CAPACITY: usize = 100_000;

/// OpenID 2.0 protocol namespace
pub const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";

/// Identifier-select sentinel used for both `claimed_id` and `identity`
pub const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Attribute exchange extension namespace
pub const AX_NS: &str = "http://openid.net/srv/ax/1.0";

/// Attribute exchange type URI for the email address
pub const AX_TYPE_EMAIL: &str = "http://axschema.org/contact/email";

/// Mode sent with the authentication request
pub const MODE_CHECKID_SETUP: &str = "checkid_setup";

/// Mode sent with the direct-verification request
pub const MODE_CHECK_AUTHENTICATION: &str = "check_authentication";

// Request and callback parameter names
pub const PARAM_MODE: &str = "openid.mode";
pub const PARAM_NS: &str = "openid.ns";
pub const PARAM_RETURN_TO: &str = "openid.return_to";
pub const PARAM_CLAIMED_ID: &str = "openid.claimed_id";
pub const PARAM_IDENTITY: &str = "openid.identity";
pub const PARAM_NS_AX: &str = "openid.ns.ax";
pub const PARAM_AX_MODE: &str = "openid.ax.mode";
pub const PARAM_AX_REQUIRED: &str = "openid.ax.required";
pub const PARAM_AX_TYPE_EMAIL: &str = "openid.ax.type.email";
pub const PARAM_SECONDARY_RETURN_TO: &str = "openid.secondary_return_to";
pub const PARAM_RESPONSE_NONCE: &str = "openid.response_nonce";
pub const PARAM_AX_VALUE_EMAIL: &str = "openid.ext1.value.email";
