use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::listing::DirectoryListing;
use crate::parse::ScanOptions;
use crate::store::{ModelStore, SchemaSource};

pub fn run<S: SchemaSource, L: DirectoryListing>(
    store: &mut ModelStore<S>,
    model: &str,
    listing: L,
    process: Option<&str>,
    options: ScanOptions,
) -> Result<CmdResult> {
    let fom = store.get_model(model)?;
    let scanned = fom
        .parse_directory(process, listing, options)?
        .collect::<Result<Vec<_>>>()?;

    let recognized = scanned.iter().filter(|i| i.recognized.is_some()).count();
    let mut result = CmdResult::default();
    if recognized == 0 {
        result.add_message(CmdMessage::info(format!(
            "No entries recognized by model {}",
            model
        )));
    }
    Ok(result.with_scanned(scanned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::memory::MemoryListing;
    use crate::store::memory::fixtures::sample_store;

    #[test]
    fn test_scan_counts() {
        let mut store = sample_store();
        let listing = MemoryListing::from_paths([
            "s01/anat/s01_T1w.nii",
            "s01/anat/s01_T1w.img",
            "s02/anat/s02_T1w.nii",
            "s02/anat/default_analysis/s02_norm.img",
            "s02/anat/notes.md",
            "README",
        ]);
        let res = run(&mut store, "sample", &listing, Some("normalize"), ScanOptions::default())
            .unwrap();
        let paths: Vec<&str> = res.scanned.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "s01/anat/s01_T1w.nii",
                "s02/anat/s02_T1w.nii",
                "s02/anat/default_analysis/s02_norm.img"
            ]
        );
        assert!(res.messages.is_empty());
    }

    #[test]
    fn test_scan_nothing_recognized() {
        let mut store = sample_store();
        let listing = MemoryListing::from_paths(["a/b/c.txt"]);
        let res = run(&mut store, "sample", &listing, None, ScanOptions::default()).unwrap();
        assert!(res.scanned.is_empty());
        assert_eq!(res.messages.len(), 1);
    }
}
