use std::{io::Cursor, io::Write as _, sync::Arc};

use serde_json::json;

use stagecast::{
    CostumePayload, Fetch, InstrumentTable, LoaderConfig, ProjectLoader, StageError, StageResult,
    INSTRUMENT_BANK,
};

/// Fetch stub that fails every request; archive loads must not need it for
/// costumes or sounds.
struct Offline;

#[async_trait::async_trait]
impl Fetch for Offline {
    async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>> {
        Err(StageError::transport(url, "offline"))
    }
}

fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for s in samples {
        writer.write_sample(*s).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    cursor.into_inner()
}

fn project_json() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "objName": "Stage",
        "sounds": [{"soundName": "pop", "soundID": 1, "md5": "c0ffee01.wav"}],
        "children": [
            {
                "objName": "Cat",
                "scripts": [[10.0, 20.0, [["whenGreenFlag"], ["forward:", 10]]]],
                "sounds": [{"soundName": "meow", "soundID": 2, "md5": "c0ffee02.wav"}],
                "costumes": [{"costumeName": "cat-a", "baseLayerID": 7, "baseLayerMD5": "c0ffee07.png"}]
            },
            {"listName": "scores", "contents": [1, 2, 3]}
        ]
    }))
    .unwrap()
}

fn loader() -> ProjectLoader {
    ProjectLoader::new(Arc::new(Offline), LoaderConfig::default())
}

#[tokio::test]
async fn archive_load_materializes_graph_and_assets() {
    let package = zip_bytes(&[
        ("project.json", &project_json()),
        ("1.wav", &wav_bytes(&[0, 1000, -1000, 0])),
        ("2.wav", &wav_bytes(&[5, 6, 7, 8, 9, 10])),
        ("7.png", &png_bytes()),
    ]);

    let mut project = loader().load_from_archive(&package).await.unwrap();
    assert!(project.pending_asset_tasks() > 0);
    project.join_assets().await.unwrap();

    let graph = &project.graph;
    assert_eq!(graph.stage.name, "Stage");
    assert_eq!(graph.sprites.len(), 1);
    assert_eq!(graph.sprites[0].name, "Cat");
    assert_eq!(graph.sprites[0].stacks.len(), 1);
    assert_eq!(graph.sprites[0].stacks[0].blocks.len(), 2);

    // Counters moved exactly once per decoded sound.
    assert_eq!(graph.stage.sounds_loaded(), 1);
    assert_eq!(graph.sprites[0].sounds_loaded(), 1);
    let buffer = graph.sprites[0].sounds[0].buffer().unwrap();
    assert_eq!(buffer.sample_rate, 44_100);
    assert!(!buffer.samples.is_empty());

    // Archive-mode costumes are embedded as data URLs.
    let payload = graph.sprites[0].costumes[0].payload().unwrap();
    let CostumePayload::DataUrl(url) = payload else {
        panic!("expected data url, got {payload:?}");
    };
    assert!(url.starts_with("data:image/png;base64,"));

    // Stage-scope list landed on the stage and in the reporter registry.
    assert!(graph.stage.has_list("scores"));
    assert_eq!(graph.reporters.len(), 1);
}

#[tokio::test]
async fn archive_miss_is_reported_by_join_not_swallowed() {
    // Package is missing the sprite's 2.wav entry.
    let package = zip_bytes(&[
        ("project.json", &project_json()),
        ("1.wav", &wav_bytes(&[0, 0])),
        ("7.png", &png_bytes()),
    ]);

    let mut project = loader().load_from_archive(&package).await.unwrap();
    let err = project.join_assets().await.unwrap_err();

    let StageError::AssetsFailed { failures } = err else {
        panic!("expected aggregated asset failure, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("2.wav"), "failure was: {}", failures[0]);

    // The successfully decoded stage sound still landed.
    assert_eq!(project.graph.stage.sounds_loaded(), 1);
}

#[tokio::test]
async fn malformed_descriptor_aborts_without_a_graph() {
    let package = zip_bytes(&[("project.json", b"{not json")]);
    let err = loader().load_from_archive(&package).await.unwrap_err();
    assert!(matches!(err, StageError::Descriptor(_)));
}

#[tokio::test]
async fn package_without_descriptor_entry_is_rejected() {
    let package = zip_bytes(&[("0.png", b"x")]);
    let err = loader().load_from_archive(&package).await.unwrap_err();
    assert!(matches!(err, StageError::Descriptor(_)));
}

/// Fetch stub serving the instrument bank, so archive loads can still fill
/// the instrument table over the network.
struct BankOnly {
    config: LoaderConfig,
}

#[async_trait::async_trait]
impl Fetch for BankOnly {
    async fn fetch_bytes(&self, url: &str) -> StageResult<Vec<u8>> {
        if INSTRUMENT_BANK
            .iter()
            .any(|(_, file)| url == self.config.soundbank_url(file))
        {
            return Ok(wav_bytes(&[1, 2, 3, 4]));
        }
        Err(StageError::transport(url, "unexpected url"))
    }
}

#[tokio::test]
async fn instrument_bank_loads_in_background_and_joins() {
    let package = zip_bytes(&[("project.json", br#"{"objName": "Stage"}"#)]);

    let config = LoaderConfig::default();
    let loader = ProjectLoader::new(
        Arc::new(BankOnly {
            config: config.clone(),
        }),
        config,
    );

    let mut project = loader.load_from_archive(&package).await.unwrap();
    project.join_all().await.unwrap();

    assert_eq!(project.instruments.loaded(), InstrumentTable::bank_size());
    assert_eq!(
        project.instruments.get("SnareDrum").unwrap().as_slice(),
        &[1, 2, 3, 4]
    );
}
