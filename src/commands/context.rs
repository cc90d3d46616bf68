use anyhow::{Context, Result};

use crate::RepoContext;
use crate::index::Index;
use crate::output;

/// Trait providing common operations for command modules
pub trait CommandContext {
    /// Loads the index document, applying the repository configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed, or if the
    /// configuration holds invalid values
    fn load_index(&self) -> Result<Index>;

    /// Writes the index document when it has pending changes
    ///
    /// Returns whether the document was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written
    fn save_index(&self, index: &mut Index) -> Result<bool>;
}

impl CommandContext for RepoContext {
    fn load_index(&self) -> Result<Index> {
        let mut index = Index::load(&self.index_path)
            .with_context(|| format!("Failed to load {}", self.index_path.display()))?;
        self.config.apply_to(&mut index, &self.root)?;
        Ok(index)
    }

    fn save_index(&self, index: &mut Index) -> Result<bool> {
        if !index.is_modified() {
            output::info("Nothing to update");
            return Ok(false);
        }

        let changelog = index.changelog();
        index
            .write(&self.index_path)
            .with_context(|| format!("Failed to write {}", self.index_path.display()))?;

        if changelog.is_empty() {
            output::success(&format!("Updated {}", self.index_path.display()));
        } else {
            output::success(&format!(
                "Updated {}: {changelog}",
                self.index_path.display()
            ));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_index_applies_config() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[index]\nname = \"Demo\"\noutput = \"out/index.xml\"\n",
        )?;

        let ctx = RepoContext::new(dir.path(), None)?;
        assert!(ctx.index_path.ends_with("out/index.xml"));

        let mut index = ctx.load_index()?;
        assert_eq!(index.name(), Some("Demo"));

        assert!(ctx.save_index(&mut index)?);
        assert!(ctx.index_path.exists());
        assert!(!ctx.save_index(&mut index)?);
        Ok(())
    }
}
