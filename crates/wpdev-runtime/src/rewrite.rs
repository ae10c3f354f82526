//! Apache rewrite rules placed in the public directory.

use crate::RuntimeError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const REWRITE_FILE_NAME: &str = ".htaccess";

const SINGLE_SITE_RULES: &str = r"# BEGIN WordPress

RewriteEngine On
RewriteRule .* - [E=HTTP_AUTHORIZATION:%{HTTP:Authorization}]
RewriteBase /
RewriteRule ^index\.php$ - [L]
RewriteCond %{REQUEST_FILENAME} !-f
RewriteCond %{REQUEST_FILENAME} !-d
RewriteRule . /index.php [L]

# END WordPress
";

// Subfolder network type.
const MULTISITE_RULES: &str = r"# BEGIN WordPress Multisite

RewriteEngine On
RewriteRule .* - [E=HTTP_AUTHORIZATION:%{HTTP:Authorization}]
RewriteBase /
RewriteRule ^index\.php$ - [L]

# add a trailing slash to /wp-admin
RewriteRule ^([_0-9a-zA-Z-]+/)?wp-admin$ $1wp-admin/ [R=301,L]

RewriteCond %{REQUEST_FILENAME} -f [OR]
RewriteCond %{REQUEST_FILENAME} -d
RewriteRule ^ - [L]
RewriteRule ^([_0-9a-zA-Z-]+/)?(wp-(content|admin|includes).*) $2 [L]
RewriteRule ^([_0-9a-zA-Z-]+/)?(.*\.php)$ $2 [L]
RewriteRule . index.php [L]

# END WordPress Multisite
";

pub fn rewrite_rules(multisite: bool) -> &'static str {
    if multisite {
        MULTISITE_RULES
    } else {
        SINGLE_SITE_RULES
    }
}

pub fn rewrite_rules_exist(dir: &Path) -> bool {
    dir.join(REWRITE_FILE_NAME).exists()
}

/// Write the rules file into `dir`, creating the directory if needed.
/// An existing file is overwritten.
pub fn write_rewrite_rules(dir: &Path, multisite: bool) -> Result<PathBuf, RuntimeError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(REWRITE_FILE_NAME);
    fs::write(&path, rewrite_rules(multisite))?;
    debug!("wrote {}", path.display());
    Ok(path)
}
