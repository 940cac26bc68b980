use super::mapper::{MappedObject, VirtualInput, VirtualOutput};
use super::template;
use crate::bond::BondObject;
use crate::consts;
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Bridge identity as seen during discovery.
#[derive(Debug, Clone)]
pub struct Bridge {
    pub base_url: String,
    pub token: String,
    pub bond_id: String,
    pub firmware: String,
}

#[derive(Serialize)]
struct DescriptorBridge<'a> {
    address: &'a str,
    bond_id: &'a str,
    firmware: &'a str,
}

/// `desc.json`
#[derive(Serialize)]
struct Descriptor<'a> {
    name: String,
    generator: &'a str,
    version: &'a str,
    homepage: &'a str,
    bridge: DescriptorBridge<'a>,
    virtual_outputs: usize,
    virtual_inputs: usize,
    needs_review: usize,
    poll_interval: u32,
    files: [&'a str; 2],
}

/// One `inventory.json` entry: the discovered object and what it became.
#[derive(Serialize)]
struct InventoryEntry<'a> {
    #[serde(flatten)]
    object: &'a BondObject,
    outputs: &'a [VirtualOutput],
    inputs: &'a [VirtualInput],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    unknown_actions: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonFile {
    pub name: &'static str,
    pub contents: Vec<u8>,
}

/// Rendered addon content, kept in memory until written.
#[derive(Debug, Clone)]
pub struct Addon {
    pub files: Vec<AddonFile>,
}

impl Addon {
    pub fn build(bridge: &Bridge, poll_interval: u32, entries: &[(BondObject, MappedObject)]) -> Result<Self> {
        let outputs: Vec<VirtualOutput> = entries
            .iter()
            .flat_map(|(_, m)| m.outputs.iter().cloned())
            .collect();
        let inputs: Vec<VirtualInput> = entries
            .iter()
            .flat_map(|(_, m)| m.inputs.iter().cloned())
            .collect();

        let descriptor = Descriptor {
            name: format!("Bond Bridge {}", bridge.bond_id),
            generator: consts::GENERATOR_NAME,
            version: consts::GENERATOR_VERSION,
            homepage: consts::GENERATOR_URL,
            bridge: DescriptorBridge {
                address: &bridge.base_url,
                bond_id: &bridge.bond_id,
                firmware: &bridge.firmware,
            },
            virtual_outputs: outputs.len(),
            virtual_inputs: inputs.len(),
            needs_review: outputs.iter().filter(|o| o.review.is_some()).count(),
            poll_interval,
            files: [consts::TEMPLATE_FILE, consts::INVENTORY_FILE],
        };

        let inventory: Vec<InventoryEntry> = entries
            .iter()
            .map(|(object, mapped)| InventoryEntry {
                object,
                outputs: &mapped.outputs,
                inputs: &mapped.inputs,
                unknown_actions: &mapped.unknown_actions,
            })
            .collect();

        let template = template::render(bridge, &outputs, &inputs);

        Ok(Self {
            files: vec![
                AddonFile {
                    name: consts::DESC_FILE,
                    contents: serde_json::to_vec_pretty(&descriptor)?,
                },
                AddonFile {
                    name: consts::TEMPLATE_FILE,
                    contents: template.into_bytes(),
                },
                AddonFile {
                    name: consts::INVENTORY_FILE,
                    contents: serde_json::to_vec_pretty(&inventory)?,
                },
            ],
        })
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.contents.as_slice())
    }

    /// Zip with fixed timestamps so identical input gives identical bytes.
    pub fn to_archive(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for file in &self.files {
            zip.start_file(file.name, options)?;
            zip.write_all(&file.contents)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Archive is fully built, written next to the target and renamed into
    /// place, so the target either holds the whole addon or is untouched.
    pub fn write_archive<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_archive()?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        if let Err(e) = fs::write(&tmp, data).and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Wrote {}", path.display());
        Ok(())
    }

    pub fn write_intermediate<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for file in &self.files {
            fs::write(dir.join(file.name), &file.contents)?;
        }
        debug!("Wrote intermediate files to {}", dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::{Action, ObjectKind};
    use crate::config::MappingConfig;
    use crate::loxone::Mapper;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::io::Read;

    fn bridge() -> Bridge {
        Bridge {
            base_url: "http://192.168.1.13".into(),
            token: "s3cret".into(),
            bond_id: "ZZBL12345".into(),
            firmware: "v3.2.1".into(),
        }
    }

    fn entries() -> Vec<(BondObject, MappedObject)> {
        let mut state = BTreeMap::new();
        state.insert("position".to_string(), json!(40));
        let shade = BondObject {
            kind: ObjectKind::Device,
            id: "aabbccdd".into(),
            name: "Patio Shade".into(),
            object_type: "MS".into(),
            location: "Patio".into(),
            actions: ["Open", "Close", "Jog"].iter().map(|a| Action::new(a, None)).collect(),
            members: Vec::new(),
            state,
            properties: BTreeMap::new(),
        };
        let mapper = Mapper::new(&MappingConfig::default(), 30);
        let mapped = mapper.map_object(&shade);
        vec![(shade, mapped)]
    }

    #[test]
    fn builds_descriptor_and_inventory() {
        let addon = Addon::build(&bridge(), 30, &entries()).unwrap();
        let names: Vec<_> = addon.files.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["desc.json", "template.xml", "inventory.json"]);

        let desc: Value = serde_json::from_slice(addon.file("desc.json").unwrap()).unwrap();
        assert_eq!(desc["bridge"]["bond_id"], "ZZBL12345");
        assert_eq!(desc["virtual_outputs"], 4);
        assert_eq!(desc["virtual_inputs"], 1);
        assert_eq!(desc["needs_review"], 2);

        let inventory: Value = serde_json::from_slice(addon.file("inventory.json").unwrap()).unwrap();
        assert_eq!(inventory[0]["id"], "aabbccdd");
        assert_eq!(inventory[0]["kind"], "DEVICE");
        assert_eq!(inventory[0]["unknown_actions"], json!(["Jog"]));
        assert_eq!(inventory[0]["outputs"][2]["review"], "digital");
    }

    #[test]
    fn archive_is_deterministic_and_readable() {
        let first = Addon::build(&bridge(), 30, &entries()).unwrap().to_archive().unwrap();
        let second = Addon::build(&bridge(), 30, &entries()).unwrap().to_archive().unwrap();
        assert_eq!(first, second);

        let mut archive = zip::ZipArchive::new(Cursor::new(first)).unwrap();
        assert_eq!(archive.len(), 3);
        let mut xml = String::new();
        archive
            .by_name("template.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Patio Shade Open"));
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let addon = Addon::build(&bridge(), 30, &entries()).unwrap();

        let out = dir.path().join("bond.LxAddon");
        addon.write_archive(&out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), addon.to_archive().unwrap());
        assert!(!dir.path().join("bond.LxAddon.tmp").exists());

        let missing = dir.path().join("no-such-dir").join("bond.LxAddon");
        assert!(addon.write_archive(&missing).is_err());
        assert!(!missing.exists());

        let intermediate = dir.path().join("parts");
        addon.write_intermediate(&intermediate).unwrap();
        for file in &addon.files {
            assert_eq!(fs::read(intermediate.join(file.name)).unwrap(), file.contents);
        }
    }
}
