use std::fs::File;

use scalekit::ScaleDataset;

/// Loads the scale dataset shipped in the project root.
pub fn load_shipped_dataset() -> ScaleDataset {
    let file =
        File::open("data/scales.json").expect("data/scales.json must exist in the project root");
    ScaleDataset::from_reader(file).expect("shipped dataset must parse")
}
