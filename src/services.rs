//! Service names for well-known TCP ports.

/// Look up the probable service name for a given port.
///
/// Returns `None` if the port is not in the well-known table.
pub fn service_name(port: u16) -> Option<&'static str> {
    let name = match port {
        20 => "ftp-data",
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "dns",
        69 => "tftp",
        80 => "http",
        88 => "kerberos",
        110 => "pop3",
        111 => "rpcbind",
        119 => "nntp",
        135 => "msrpc",
        139 => "netbios-ssn",
        143 => "imap",
        179 => "bgp",
        389 => "ldap",
        443 => "https",
        445 => "microsoft-ds",
        465 => "smtps",
        514 => "syslog",
        515 => "printer",
        548 => "afp",
        554 => "rtsp",
        587 => "submission",
        631 => "ipp",
        636 => "ldaps",
        873 => "rsync",
        993 => "imaps",
        995 => "pop3s",
        1080 => "socks",
        1433 => "ms-sql-s",
        1521 => "oracle",
        1723 => "pptp",
        1883 => "mqtt",
        2049 => "nfs",
        2375 => "docker",
        3000 => "grafana",
        3128 => "squid",
        3306 => "mysql",
        3389 => "ms-wbt-server",
        5000 => "upnp",
        5060 => "sip",
        5432 => "postgresql",
        5672 => "amqp",
        5900 => "vnc",
        5985 => "wsman",
        6379 => "redis",
        6443 => "kubernetes-api",
        8000 => "http-alt",
        8080 => "http-proxy",
        8443 => "https-alt",
        8888 => "http-alt",
        9090 => "prometheus",
        9092 => "kafka",
        9200 => "elasticsearch",
        11211 => "memcached",
        27017 => "mongodb",
        62078 => "iphone-sync",
        _ => return None,
    };
    Some(name)
}

/// Service name for a port, or `"unknown"`.
pub fn service_description(port: u16) -> &'static str {
    service_name(port).unwrap_or("unknown")
}

/// Ports where a silent service is likely to answer an HTTP request.
pub fn is_http_port(port: u16) -> bool {
    matches!(
        port,
        80 | 443 | 3000 | 8000 | 8008 | 8080 | 8081 | 8443 | 8888 | 9000 | 9090 | 9200
    )
}
