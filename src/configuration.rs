use crate::scene::SimulationSize;
use crate::simulator::SimulatorSettings;
use config::ConfigError;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
struct DemoSettingsImpl {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    width: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    height: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    exposure: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    interactive_segments_to_trace: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    standard_tracer_size: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    final_segments_to_trace: u64,
    format: ImageFormat,
    path: String,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
    Ppm,
    Tiff,
}

/// Settings for the demo binary: simulation size, exposure, the
/// simulator's work-sizing knobs, and where the finished frame goes.
#[derive(Clone)]
pub struct DemoSettings {
    pub size: SimulationSize,
    pub exposure: f64,
    pub simulator: SimulatorSettings,
    pub format: ImageFormat,
    pub path: String,
}

impl DemoSettings {
    fn new(settings: DemoSettingsImpl) -> DemoSettings {
        DemoSettings {
            size: SimulationSize::new(settings.width, settings.height),
            exposure: settings.exposure,
            simulator: SimulatorSettings {
                interactive_segments_to_trace: settings.interactive_segments_to_trace,
                final_segments_to_trace: settings.final_segments_to_trace,
                standard_tracer_size: settings.standard_tracer_size,
            },
            format: settings.format,
            path: settings.path,
        }
    }
}

pub fn load_configuration() -> Result<DemoSettings, ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let f = config::File::from(configuration_directory.join("base.yaml"));
    let settings = config::Config::builder().add_source(f).build()?;

    settings
        .try_deserialize::<DemoSettingsImpl>()
        .map(DemoSettings::new)
}
