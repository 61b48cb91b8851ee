//! Summarizing an access log with a shared configuration.
//!
//! Shows label conventions, per-property overrides, a custom converter that
//! delegates to a built-in one, and the tracing events the reader emits.
//!
//! Run with: cargo run --example access_log

use chrono::{DateTime, FixedOffset};
use ltsv_helper::convert::{DateTimeConverter, FieldSource};
use ltsv_helper::{
    ClassMapBuilder, Configuration, LabelConvention, LtsvReader, Mappable, PropertyInfo,
    TypeConverter, Value,
};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

const LOG: &str = "\
time:[10/Oct/2024:13:55:36 +0900]\thost:10.0.0.1\treq:GET / HTTP/1.1\tstatus:200\tsize:5316\treqtime:0.012
time:[10/Oct/2024:13:55:37 +0900]\thost:10.0.0.2\treq:GET /missing HTTP/1.1\tstatus:404\tsize:153\treqtime:0.002

time:[10/Oct/2024:13:55:39 +0900]\thost:10.0.0.1\treq:POST /api HTTP/1.1\tstatus:201\tsize:42\treqtime:0.120\tvhost:api.example.com
";

#[derive(Debug)]
struct Access {
    time: Option<DateTime<FixedOffset>>,
    host: String,
    request: String,
    status: u16,
    size: u64,
    request_time: f64,
    virtual_host: Option<String>,
}

impl Mappable for Access {
    fn configure(map: &mut ClassMapBuilder<Self>) {
        map.constructor(|| Access {
            time: None,
            host: String::new(),
            request: String::new(),
            status: 0,
            size: 0,
            request_time: 0.0,
            virtual_host: None,
        });
        map.property("Time", |a: &mut Access, v: Option<DateTime<FixedOffset>>| a.time = v)
            .converter(Arc::new(BracketedTime));
        map.property("Host", |a: &mut Access, v: String| a.host = v);
        map.property("Req", |a: &mut Access, v: String| a.request = v);
        map.property("Status", |a: &mut Access, v: u16| a.status = v);
        map.property("Size", |a: &mut Access, v: u64| a.size = v);
        map.property("RequestTime", |a: &mut Access, v: f64| a.request_time = v);
        map.property("VirtualHost", |a: &mut Access, v: Option<String>| a.virtual_host = v);
    }
}

/// Strips the brackets of the access-log time field before parsing it.
struct BracketedTime;

impl TypeConverter for BracketedTime {
    fn convert_from_string(
        &self,
        raw: Option<&str>,
        reader: &dyn FieldSource,
        map: &PropertyInfo,
    ) -> ltsv_helper::Result<Value> {
        let raw = raw.map(|s| s.trim_start_matches('[').trim_end_matches(']'));
        DateTimeConverter.convert_from_string(raw, reader, map)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut config = Configuration::new().with_label_convention(LabelConvention::Lowercase);
    config
        .override_label::<Access>("RequestTime", "reqtime")
        .override_label::<Access>("VirtualHost", "vhost");
    let config = Arc::new(config);

    let mut reader = LtsvReader::with_configuration(LOG.as_bytes(), Arc::clone(&config));
    let mut by_status: BTreeMap<u16, (usize, u64)> = BTreeMap::new();
    let mut slowest: Option<Access> = None;

    for access in reader.records::<Access>() {
        let access = access?;
        let entry = by_status.entry(access.status).or_default();
        entry.0 += 1;
        entry.1 += access.size;

        if slowest
            .as_ref()
            .map_or(true, |s| access.request_time > s.request_time)
        {
            slowest = Some(access);
        }
    }
    reader.close();

    for (status, (count, bytes)) in &by_status {
        println!("{status}: {count} request(s), {bytes} bytes");
    }
    if let Some(access) = slowest {
        println!(
            "slowest: {} from {} at {:?} ({}s, vhost {:?})",
            access.request, access.host, access.time, access.request_time, access.virtual_host
        );
    }

    Ok(())
}
