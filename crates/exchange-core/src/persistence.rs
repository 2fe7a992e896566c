use crate::error::{ExchangeError, Result};
use crate::exchange::Exchange;
use std::fs;
use std::path::Path;
use tracing::info;

/// Whole-state snapshot of an [`Exchange`] as a single bincode blob.
///
/// Popularity scores are not stored; they are recomputed on first use.
pub struct Snapshot;

impl Snapshot {
    pub fn save(exchange: &Exchange, path: &Path) -> Result<()> {
        let data = bincode::serialize(exchange).map_err(|e| ExchangeError::snapshot(path, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExchangeError::io(parent, e))?;
        }
        fs::write(path, data).map_err(|e| ExchangeError::io(path, e))?;
        info!(
            path = %path.display(),
            numbers = exchange.graph.size(),
            calls = exchange.graph.call_count(),
            "exchange saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Exchange> {
        if !path.exists() {
            return Err(ExchangeError::SnapshotMissing(path.to_path_buf()));
        }

        let data = fs::read(path).map_err(|e| ExchangeError::io(path, e))?;
        let exchange: Exchange =
            bincode::deserialize(&data).map_err(|e| ExchangeError::snapshot(path, e))?;
        info!(
            path = %path.display(),
            numbers = exchange.graph.size(),
            calls = exchange.graph.call_count(),
            "exchange loaded"
        );
        Ok(exchange)
    }

    /// Like [`Snapshot::load`], but an absent file yields an empty exchange.
    pub fn load_or_default(path: &Path) -> Result<Exchange> {
        match Self::load(path) {
            Err(ExchangeError::SnapshotMissing(_)) => Ok(Exchange::new()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_snapshot() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.bin");

        assert!(matches!(
            Snapshot::load(&path),
            Err(ExchangeError::SnapshotMissing(_))
        ));
        assert!(Snapshot::load_or_default(&path)?.graph.is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_snapshot() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("corrupt.bin");
        fs::write(&path, b"definitely not bincode")?;

        assert!(matches!(
            Snapshot::load(&path),
            Err(ExchangeError::Snapshot { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_save_creates_parent_directories() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/state/exchange.bin");

        let mut exchange = Exchange::new();
        exchange.add_contact("Ana Petrović", "0641111111");
        Snapshot::save(&exchange, &path)?;

        let restored = Snapshot::load(&path)?;
        assert_eq!(restored.directory, exchange.directory);
        Ok(())
    }

    #[test]
    fn test_clock_is_reinjected_after_load() -> anyhow::Result<()> {
        fn noon() -> chrono::NaiveDateTime {
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap_or_default()
        }

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("exchange.bin");
        let mut exchange = Exchange::new();
        exchange.graph.set_clock(noon);
        exchange.add_contact("Ana Petrović", "0641111111");
        exchange.record_call("0641111111", "0642222222", 60, None);
        Snapshot::save(&exchange, &path)?;

        let mut restored = Snapshot::load(&path)?;
        restored.graph.set_clock(noon);
        restored.record_call("0642222222", "0641111111", 30, None);

        let history = restored.graph.call_history("0641111111", None);
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|call| call.timestamp == noon()));
        Ok(())
    }
}
