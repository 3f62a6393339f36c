use std::{fs, path::Path};

use anyhow::Context;

/// Opens the sled database under `<datadir>/sled/<dbname>`, creating the
/// directory if needed.
pub fn open_sled_database(datadir: &Path, dbname: &'static str) -> anyhow::Result<sled::Db> {
    let mut database_dir = datadir.to_path_buf();
    database_dir.push("sled");
    database_dir.push(dbname);

    if !database_dir.exists() {
        fs::create_dir_all(&database_dir)?;
    }

    sled::open(&database_dir).context("opening sled database")
}
