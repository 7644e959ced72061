//! Headless demo: renders one frame of an OBJ file (or a cube) to a PNG.
//!
//! ```text
//! softview [model.obj] [Key=Value ...]
//! softview teapot.obj RenderMode=smooth Definition=high Lighting=threepoint
//! ```
//!
//! Set `RUST_LOG=debug` for pipeline logging.

use anyhow::{bail, Context, Result};
use log::info;
use softview::prelude::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const OUTPUT: &str = "softview.png";

fn main() -> Result<()> {
    env_logger::init();

    let mut model = None;
    let mut params = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.split_once('=') {
            Some((key, value)) => params.push((key.to_string(), value.to_string())),
            None if model.is_none() => model = Some(arg),
            None => bail!("unexpected argument '{arg}'"),
        }
    }

    let config = RenderConfig::from_params(params).context("invalid parameters")?;
    let mut viewer = Viewer::new(WIDTH, HEIGHT, config);

    let scene = match &model {
        Some(path) => {
            softview::loader::load_obj(path, true).with_context(|| format!("loading {path}"))?
        }
        None => {
            let mut scene = Scene::new();
            scene.add_child(Mesh::cube(2.0));
            scene
        }
    };
    viewer.replace_scene(scene);
    viewer.render_frame();

    let pixels = viewer.to_rgba8();
    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels)
        .context("display buffer does not match the image size")?;
    image
        .save(OUTPUT)
        .with_context(|| format!("writing {OUTPUT}"))?;
    info!("wrote {OUTPUT}");
    Ok(())
}
