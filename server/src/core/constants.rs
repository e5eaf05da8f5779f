// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Insight";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "insight";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".insight";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "insight.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "INSIGHT_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "INSIGHT_DEBUG";

/// Environment variable for server host
pub const ENV_HOST: &str = "INSIGHT_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "INSIGHT_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "INSIGHT_LOG";

/// Environment variable for the analytics query service base URL
pub const ENV_ANALYTICS_URL: &str = "INSIGHT_ANALYTICS_URL";

/// Environment variable for the analytics request timeout
pub const ENV_ANALYTICS_TIMEOUT_SECS: &str = "INSIGHT_ANALYTICS_TIMEOUT_SECS";

/// Environment variable for analytics retry attempts
pub const ENV_ANALYTICS_MAX_ATTEMPTS: &str = "INSIGHT_ANALYTICS_MAX_ATTEMPTS";

/// Environment variable to toggle coalescing of identical queries
pub const ENV_DISPATCH_COALESCE: &str = "INSIGHT_DISPATCH_COALESCE";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// API route prefix
pub const API_PREFIX: &str = "/api/v1";

// =============================================================================
// Analytics Query Service
// =============================================================================

/// Default analytics query service base URL
pub const DEFAULT_ANALYTICS_URL: &str = "http://localhost:8000";

/// Path of the statement execution endpoint
pub const ANALYTICS_EXECUTE_PATH: &str = "/analytics/execute";

/// Default analytics request timeout in seconds
pub const DEFAULT_ANALYTICS_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
