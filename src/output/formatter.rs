use std::io::Write;
use std::path::Path;

use crate::error::InspectError;

/// Write the generated module to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&Path>, module: &str) -> Result<(), InspectError> {
    let Some(path) = output else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        return handle
            .write_all(module.as_bytes())
            .and_then(|()| handle.flush())
            .map_err(|e| InspectError::io("<stdout>", e));
    };

    validate_output_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| InspectError::io(parent, e))?;
    }
    std::fs::write(path, module).map_err(|e| InspectError::io(path, e))?;
    log::debug!("wrote {} bytes to {}", module.len(), path.display());
    Ok(())
}

/// Conventional file name for a module generated from `input`, e.g. `shop.sql` -> `shop_models.py`.
pub fn default_module_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("output");
    format!("{stem}_models.py")
}

fn validate_output_path(path: &Path) -> Result<(), InspectError> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Err(InspectError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output path must name a file",
            ),
        ));
    }
    Ok(())
}
