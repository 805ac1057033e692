use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use lightbox::objects::{CircleShape, PolygonShape, Wall};
use lightbox::{
    load_configuration, FractionalLightColor, ImageFormat as ConfImageFormat, Light, LightColor,
    Point, ShapeAttributes, SimulationLayout, SimulationSize, Simulator,
};
use std::sync::{mpsc, Mutex};

fn main() {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .expect("could not install logger");

    let settings = load_configuration().expect("could not read settings");

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let simulator = Simulator::new(
        settings.size,
        settings.exposure,
        settings.simulator,
        Box::new(move |snapshot| drop(tx.lock().unwrap().send(snapshot))),
    )
    .expect("could not build worker pools");

    simulator.restart(showcase_layout(settings.size), false);

    let pb = ProgressBar::new(settings.simulator.final_segments_to_trace);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.yellow}] {pos}/{len} segments",
        )
        .expect("static progress template is well-formed"),
    );

    let mut latest = None;
    while let Ok(snapshot) = rx.recv() {
        pb.set_position(snapshot.total_segments_traced);
        let finished =
            snapshot.total_segments_traced >= settings.simulator.final_segments_to_trace;
        latest = Some(snapshot);
        if finished {
            break;
        }
    }
    pb.finish();

    if let Some(snapshot) = latest {
        snapshot
            .image
            .save_with_format(
                std::path::Path::new(&settings.path),
                get_format(settings.format),
            )
            .expect("Unable to save image in specified format");
        log::info!(
            "wrote {} after {} segments",
            settings.path,
            snapshot.total_segments_traced
        );
    }
}

/// A scene that exercises everything at once: two colored lights, a
/// slightly diffuse mirror wall, a glass circle and a glass prism.
fn showcase_layout(size: SimulationSize) -> SimulationLayout {
    let w = size.width as f64;
    let h = size.height as f64;

    let glass = ShapeAttributes {
        absorption: FractionalLightColor::new(0.05, 0.05, 0.05),
        diffusion: 0.0,
        index_of_refraction: 1.5,
        translucent: true,
    };
    let mirror = ShapeAttributes {
        absorption: FractionalLightColor::new(0.1, 0.1, 0.1),
        diffusion: 0.05,
        index_of_refraction: 1.0,
        translucent: false,
    };

    SimulationLayout::new(
        1,
        vec![
            Light::new(
                Point::new(w * 0.30, h * 0.35),
                LightColor::new(255, 230, 180),
            ),
            Light::new(
                Point::new(w * 0.72, h * 0.60),
                LightColor::new(150, 180, 255),
            ),
        ],
        vec![Wall::new(
            Point::new(w * 0.15, h * 0.75),
            Point::new(w * 0.45, h * 0.85),
            mirror,
        )],
        vec![CircleShape::new(
            Point::new(w * 0.55, h * 0.40),
            w * 0.08,
            glass.clone(),
        )],
        vec![PolygonShape::new(
            vec![
                Point::new(w * 0.62, h * 0.72),
                Point::new(w * 0.78, h * 0.78),
                Point::new(w * 0.66, h * 0.88),
            ],
            glass,
        )],
    )
}

fn get_format(format: ConfImageFormat) -> ImageFormat {
    match format {
        ConfImageFormat::Jpg => ImageFormat::Jpeg,
        ConfImageFormat::Png => ImageFormat::Png,
        ConfImageFormat::Tiff => ImageFormat::Tiff,
        ConfImageFormat::Ppm => ImageFormat::Pnm,
    }
}
