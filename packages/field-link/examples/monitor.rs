use field_link::{serial, LinkConfig, LinkError, StandardEngine};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), LinkError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    // Optional path to an INI file, defaults otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => LinkConfig::from_ini(&tokio::fs::read_to_string(path).await?)?,
        None => LinkConfig::default(),
    };

    for port in serial::find_ports()? {
        info!("Bluetooth port available: {}", port.port_name);
    }

    let source = serial::SerialSource::open(&config)?;
    let mut engine = StandardEngine::with_options(source, config.engine_options());

    let mut reader = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(snapshot) = reader.changed().await {
            info!(
                "{} robots, {} balls",
                snapshot.robots().len(),
                snapshot.balls().len()
            );
            for robot in snapshot.robots() {
                info!(
                    "  robot {} at ({:.1}, {:.1}) heading {:.3} rad",
                    robot.id, robot.pos.x, robot.pos.y, robot.heading
                );
            }
        }
    });

    let err = engine.run().await;
    error!("Stopped: {}", err);
    info!("{:?}", engine.stats());

    Err(err)
}
