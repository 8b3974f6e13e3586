//! Loads the bundled barrel model and textures when they are present.

use std::path::{Path, PathBuf};

use vkpbr_resources::{ImageData, MeshData};

fn asset_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
}

#[test]
fn test_load_barrel_model() {
    let model_path = asset_root().join("models/Barrel.obj");

    // Assets are not checked in everywhere
    if !model_path.exists() {
        eprintln!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let mesh = MeshData::load_obj(&model_path).expect("Failed to load OBJ model");

    assert!(!mesh.vertices.is_empty(), "Model should have vertices");
    assert_eq!(mesh.indices.len() % 3, 0, "Indices should form triangles");
    assert!(
        mesh.indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertices.len()),
        "Every index should address a vertex"
    );
    assert!(
        mesh.vertices
            .iter()
            .all(|v| v.tangent.length() < 1.0 + 1e-4),
        "Tangents should be normalized or zero"
    );

    println!(
        "Loaded model with {} vertices and {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
}

#[test]
fn test_load_barrel_textures() {
    let names = [
        "barrel_BaseColor.png",
        "barrel_Metallic.png",
        "barrel_Normal.png",
        "barrel_Roughness.png",
    ];

    for name in names {
        let path = asset_root().join("textures").join(name);
        if !path.exists() {
            eprintln!("Skipping texture: not found at {:?}", path);
            continue;
        }

        let image = ImageData::load_rgba8(&path).expect("Failed to decode texture");
        assert_eq!(
            image.byte_len(),
            image.width as usize * image.height as usize * 4,
            "{} should decode to RGBA8",
            name
        );
    }
}
