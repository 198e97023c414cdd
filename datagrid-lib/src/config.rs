//! Grid configuration

/// Default namespace prefix for persisted settings keys.
pub const DEFAULT_NAMESPACE: &str = "datagrid";
/// Default row id field.
pub const DEFAULT_ROW_ID_KEY: &str = "id";
/// Default key of the UI-only actions column.
pub const DEFAULT_ACTIONS_KEY: &str = "actions";

/// Configuration shared by every table a host creates.
///
/// # Example
///
/// ```
/// use datagrid_lib::config::GridConfig;
///
/// let config = GridConfig::default()
///     .with_namespace("acme")
///     .with_row_id_key("invoice_no")
///     .with_page_size(25);
///
/// assert_eq!(config.page_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Prefix of persisted settings keys (`{namespace}-columns-{table_id}`).
    ///
    /// Default: `"datagrid"`
    pub namespace: String,

    /// Field holding each row's unique id.
    ///
    /// Default: `"id"`
    pub row_id_key: String,

    /// Column key treated as UI-only actions and never exported.
    ///
    /// Default: `"actions"`
    pub actions_key: String,

    /// Initial page size.
    ///
    /// Default: 10
    pub page_size: usize,

    /// Page sizes offered to the user.
    ///
    /// Default: `[10, 25, 50, 100]`
    pub page_size_options: Vec<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            row_id_key: DEFAULT_ROW_ID_KEY.to_string(),
            actions_key: DEFAULT_ACTIONS_KEY.to_string(),
            page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
        }
    }
}

impl GridConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the settings key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the row id field.
    pub fn with_row_id_key(mut self, key: impl Into<String>) -> Self {
        self.row_id_key = key.into();
        self
    }

    /// Sets the actions column key.
    pub fn with_actions_key(mut self, key: impl Into<String>) -> Self {
        self.actions_key = key.into();
        self
    }

    /// Sets the initial page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the offered page sizes.
    pub fn with_page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = options;
        self
    }
}

/// Options for building an export payload and encoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Document title, also used for the file name.
    ///
    /// Default: `"Export"`
    pub title: String,

    /// Maximum display size of embedded images, in pixels.
    ///
    /// Default: 50
    pub image_max_px: u32,

    /// Prefix CSV output with a UTF-8 byte order mark so spreadsheet apps
    /// detect the encoding.
    ///
    /// Default: `true`
    pub include_bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Export".to_string(),
            image_max_px: 50,
            include_bom: true,
        }
    }
}

impl ExportOptions {
    /// Creates export options with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the image size bound.
    pub fn with_image_max_px(mut self, px: u32) -> Self {
        self.image_max_px = px;
        self
    }

    /// Enables or disables the CSV byte order mark.
    pub fn with_bom(mut self, include: bool) -> Self {
        self.include_bom = include;
        self
    }
}
