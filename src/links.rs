//! Link registration and dispatch
//!
//! A link string is a name with optional parameters, e.g. `dummy`,
//! `dummy:auto=1` or `serial:dev=/dev/ttyUSB0:38400`.

use pirlink_core::{LinkConfig, Transport};

/// Information about a link
pub struct LinkInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available links (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_links() -> Vec<LinkInfo> {
    let mut links = Vec::new();

    #[cfg(feature = "dummy")]
    links.push(LinkInfo {
        name: "dummy",
        aliases: &["sim"],
        description: "Simulated sensor for testing (auto=<0|1>,temp=<0.1 degC>,status=<hex>)",
    });

    #[cfg(feature = "serial")]
    links.push(LinkInfo {
        name: "serial",
        aliases: &["uart"],
        description: "Serial port (dev=<port>[:baud])",
    });

    #[cfg(feature = "serial")]
    links.push(LinkInfo {
        name: "tcp",
        aliases: &[],
        description: "Serial-to-TCP bridge (ip=<host:port>)",
    });

    links
}

/// Generate help text listing all available links
pub fn link_help() -> String {
    let links = available_links();

    if links.is_empty() {
        return "No links available (recompile with link features enabled)".to_string();
    }

    let mut help = String::from("Available links:\n");
    for l in &links {
        help.push_str(&format!("  {:8} - {}\n", l.name, l.description));
    }
    help
}

/// Resolve a link name or alias
pub fn find_link(name: &str) -> Option<&'static str> {
    available_links()
        .into_iter()
        .find(|l| l.name == name || l.aliases.contains(&name))
        .map(|l| l.name)
}

/// Parse a link string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_link_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the link named by `link`
#[cfg_attr(not(feature = "serial"), allow(unused_variables))]
pub fn open_link(
    link: &str,
    config: &LinkConfig,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    let (name, options) = parse_link_string(link);

    let canonical_name = match find_link(name) {
        Some(n) => n,
        None => return Err(unknown_link_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let dummy = dummy_config(&options)?;
            log::info!("Using simulated sensor");
            Ok(Box::new(pirlink_dummy::DummySensor::new(dummy)))
        }

        #[cfg(feature = "serial")]
        "serial" => {
            use pirlink_serial::LinkConnection;

            let dev = find_option(&options, "dev").ok_or(
                "serial requires a port.\nUsage: serial:dev=/dev/ttyUSB0[:baud]",
            )?;
            let conn = LinkConnection::parse(&format!("dev={}", dev))?;
            let conn = match conn {
                LinkConnection::Serial { device, baud: None } => LinkConnection::Serial {
                    device,
                    baud: Some(config.baud_rate),
                },
                other => other,
            };
            conn.open()
                .map_err(|e| format!("Failed to open serial port {}: {}", dev, e).into())
        }

        #[cfg(feature = "serial")]
        "tcp" => {
            let ip = find_option(&options, "ip")
                .ok_or("tcp requires an address.\nUsage: tcp:ip=host:port")?;
            pirlink_serial::open_link(&format!("ip={}", ip))
                .map_err(|e| format!("Failed to connect to {}: {}", ip, e).into())
        }

        _ => Err(unknown_link_error(name)),
    }
}

fn find_option<'a>(options: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    options.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(feature = "dummy")]
fn dummy_config(
    options: &[(&str, &str)],
) -> Result<pirlink_dummy::DummyConfig, Box<dyn std::error::Error>> {
    let mut config = pirlink_dummy::DummyConfig::default();

    for &(key, value) in options {
        match key {
            "auto" => config.auto_mode = matches!(value, "1" | "yes" | "true"),
            "temp" => {
                config.temperature = value
                    .parse()
                    .map_err(|_| format!("Invalid dummy temp: {}", value))?
            }
            "status" => {
                let hex = value.trim_start_matches("0x");
                config.status = u8::from_str_radix(hex, 16)
                    .map_err(|_| format!("Invalid dummy status: {}", value))?
            }
            _ => log::warn!("Ignoring unknown dummy option: {}", key),
        }
    }

    Ok(config)
}

fn unknown_link_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown link: {}\n\n", name);
    msg.push_str(&link_help());
    msg.push_str("\nUse 'pirlink list-links' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_string() {
        assert_eq!(parse_link_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_link_string("serial:dev=/dev/ttyUSB0:9600"),
            ("serial", vec![("dev", "/dev/ttyUSB0:9600")])
        );
        assert_eq!(
            parse_link_string("dummy:auto=1,temp=300"),
            ("dummy", vec![("auto", "1"), ("temp", "300")])
        );
    }

    #[test]
    fn test_unknown_link() {
        assert!(find_link("carrier-pigeon").is_none());
        assert!(open_link("carrier-pigeon", &LinkConfig::default()).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_link_options() {
        assert_eq!(find_link("sim"), Some("dummy"));

        let config = dummy_config(&[("auto", "1"), ("temp", "300"), ("status", "0x21")]).unwrap();
        assert!(config.auto_mode);
        assert_eq!(config.temperature, 300);
        assert_eq!(config.status, 0x21);

        assert!(dummy_config(&[("temp", "hot")]).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_link() {
        let transport = open_link("dummy:temp=100", &LinkConfig::default()).unwrap();
        let mut sensor = pirlink_core::Bm22s402::new(transport);
        assert_eq!(sensor.temperature(), Ok(pirlink_core::Temperature(100)));
    }

    #[cfg(feature = "serial")]
    #[test]
    fn test_serial_link_requires_port() {
        assert!(open_link("serial", &LinkConfig::default()).is_err());
        assert!(open_link("tcp:ip=nowhere", &LinkConfig::default()).is_err());
    }
}
