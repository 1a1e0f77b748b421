//! The built-in development chain written by `Service::gen_dev`

use super::descriptor::{Dna, EntryDef, FunctionDef, Progenitor, Zome};
use crate::error::ServiceResult;
use crate::layout::PROPERTIES_SCHEMA_FILE;
use crate::staging::write_file;
use std::path::Path;

pub const SAMPLE_ZOME: &str = "zySampleZome";
pub const SAMPLE_SCENARIO: &str = "sampleScenario";

/// A file of the sample tree, relative to the instance root
pub struct SampleAsset {
    pub path: &'static str,
    pub contents: &'static str,
}

macro_rules! asset {
    ($path:literal) => {
        SampleAsset {
            path: $path,
            contents: include_str!(concat!("../../templates/dev/", $path)),
        }
    };
}

/// Every non-descriptor file of the sample chain
pub const DEV_ASSETS: &[SampleAsset] = &[
    asset!("dna/properties_schema.json"),
    asset!("dna/zySampleZome/zySampleZome.zy"),
    asset!("dna/zySampleZome/profile.json"),
    asset!("ui/index.html"),
    asset!("ui/hc.js"),
    asset!("test/testSet1.json"),
    asset!("test/sampleScenario/listener.json"),
    asset!("test/sampleScenario/speaker.json"),
    asset!("test/sampleScenario/_config.json"),
];

/// Descriptor of the sample chain
pub fn dev_dna(name: &str, progenitor: Progenitor) -> Dna {
    let mut dna = Dna::new(name, progenitor);
    dna.properties_schema_file = Some(PROPERTIES_SCHEMA_FILE.to_string());
    dna.properties
        .insert("description".to_string(), "a sample chain".to_string());
    dna.properties.insert("language".to_string(), "en".to_string());

    let entry = |name: &str, data_format: &str, schema_file: Option<&str>| EntryDef {
        name: name.to_string(),
        data_format: data_format.to_string(),
        sharing: "public".to_string(),
        schema_file: schema_file.map(str::to_string),
    };
    let function = |name: &str, calling_type: &str| FunctionDef {
        name: name.to_string(),
        calling_type: calling_type.to_string(),
        exposure: "public".to_string(),
    };

    dna.zomes.push(Zome {
        name: SAMPLE_ZOME.to_string(),
        description: "zome that implements a trivial even-number and profile store".to_string(),
        ribosome_type: "zygo".to_string(),
        code_file: format!("{}.zy", SAMPLE_ZOME),
        entries: vec![
            entry("evenNumbers", "zygo", None),
            entry("primes", "zygo", None),
            entry("profile", "json", Some("profile.json")),
        ],
        functions: vec![
            function("addEven", "string"),
            function("addPrime", "json"),
            function("addProfile", "json"),
        ],
    });
    dna
}

/// Write every sample asset under `root`
pub fn write_dev_assets(root: &Path) -> ServiceResult<()> {
    for asset in DEV_ASSETS {
        write_file(&root.join(asset.path), asset.contents)?;
    }
    Ok(())
}
