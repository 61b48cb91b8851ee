use ltsv_helper::convert::{DecimalConverter, DefaultTypeConverter, FieldSource};
use ltsv_helper::{
    ClassMapBuilder, Configuration, Decimal, DuplicateLabelPolicy, EmptyLinePolicy, Error,
    LabelConvention, LtsvOptions, LtsvReader, Mappable, PropertyInfo, Record, Result,
    TypeConverter, Value, ValueKind,
};
use std::io::{self, BufRead, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default, Debug, PartialEq)]
struct Person {
    name: String,
    age: i32,
}

impl Mappable for Person {
    fn configure(map: &mut ClassMapBuilder<Self>) {
        map.default_constructor();
        map.property("Name", |p: &mut Person, v: String| p.name = v)
            .label("name");
        map.property("Age", |p: &mut Person, v: i32| p.age = v)
            .label("age");
    }
}

#[test]
fn test_single_record_mapping() {
    let mut reader = LtsvReader::from_str("name:Alice\tage:30\n");
    assert!(reader.read().unwrap());
    let person: Person = reader.get_record().unwrap();
    assert_eq!(
        person,
        Person {
            name: "Alice".to_string(),
            age: 30
        }
    );
}

#[test]
fn test_two_records_in_order() {
    let mut reader = LtsvReader::from_str("name:Alice\tage:30\nname:Bob\tage:25\n");
    let people: Vec<Person> = reader
        .records::<Person>()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].name, "Alice");
    assert_eq!(people[1].name, "Bob");
    assert!(!reader.read().unwrap());
}

#[test]
fn test_missing_label_keeps_default() {
    let mut reader = LtsvReader::from_str("name:Carol\n");
    reader.read().unwrap();
    let person: Person = reader.get_record().unwrap();
    assert_eq!(person.name, "Carol");
    assert_eq!(person.age, 0);
}

#[test]
fn test_missing_label_keeps_constructor_value() {
    #[derive(Debug)]
    struct Job {
        state: String,
        retries: u8,
    }

    impl Mappable for Job {
        fn configure(map: &mut ClassMapBuilder<Self>) {
            map.constructor(|| Job {
                state: "queued".to_string(),
                retries: 3,
            });
            map.property("state", |j: &mut Job, v: String| j.state = v);
            map.property("retries", |j: &mut Job, v: u8| j.retries = v);
        }
    }

    let mut reader = LtsvReader::from_str("retries:0\n");
    reader.read().unwrap();
    let job: Job = reader.get_record().unwrap();
    assert_eq!(job.state, "queued");
    assert_eq!(job.retries, 0);
}

#[test]
fn test_get_field_returns_text_after_first_colon() {
    let input = "time:2024-01-01T10:30:00Z\turl:http://example.com:8080/\tempty:\n";
    let mut reader = LtsvReader::from_str(input);
    reader.read().unwrap();
    assert_eq!(reader.get_field("time").unwrap(), "2024-01-01T10:30:00Z");
    assert_eq!(reader.get_field("url").unwrap(), "http://example.com:8080/");
    assert_eq!(reader.get_field("empty").unwrap(), "");
}

#[test]
fn test_state_error_before_read() {
    let reader = LtsvReader::from_str("name:Alice\n");
    match reader.get_field("name") {
        Err(Error::State(msg)) => assert!(msg.contains("read")),
        other => panic!("Expected state error, got {:?}", other),
    }
}

#[test]
fn test_missing_field_is_key_error() {
    let mut reader = LtsvReader::from_str("name:Alice\n");
    reader.read().unwrap();
    assert!(matches!(
        reader.get_field("age"),
        Err(Error::MissingField { line: 1, .. })
    ));
}

#[test]
fn test_malformed_line_is_parse_error() {
    let mut reader = LtsvReader::from_str("name:Alice\nname\n");
    assert!(reader.read().unwrap());
    match reader.read() {
        Err(Error::Parse { line, field, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(field, "name");
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_conversion_error_names_label() {
    let mut reader = LtsvReader::from_str("name:Dan\tage:old\n");
    reader.read().unwrap();
    match reader.get_record::<Person>() {
        Err(Error::Conversion { label, target, value }) => {
            assert_eq!(label, "age");
            assert_eq!(target, ValueKind::I32);
            assert_eq!(value.as_deref(), Some("old"));
        }
        other => panic!("Expected conversion error, got {:?}", other),
    }
}

#[test]
fn test_decimal_fallback_matches_default() {
    let record: Record = [("price", "abc")].into_iter().collect();
    let info = PropertyInfo::new("Price", "price", ValueKind::Decimal);

    let specific = DecimalConverter.convert_from_string(Some("abc"), &record, &info);
    let default = DefaultTypeConverter.convert_from_string(Some("abc"), &record, &info);
    assert_eq!(specific.unwrap_err().to_string(), default.unwrap_err().to_string());

    let specific = DecimalConverter.convert_from_string(Some("1,234.50"), &record, &info);
    assert_eq!(
        specific.unwrap(),
        Value::Decimal(Decimal::new(123_450, 2))
    );
}

#[test]
fn test_empty_line_policies() {
    let input = "a:1\n\na:2\n";

    let mut reader = LtsvReader::from_str(input);
    let mut seen = Vec::new();
    while reader.read().unwrap() {
        seen.push(reader.get_field("a").unwrap().to_string());
    }
    assert_eq!(seen, vec!["1", "2"]);

    let options = LtsvOptions::new().with_empty_lines(EmptyLinePolicy::EndOfStream);
    let mut reader = LtsvReader::with_options(input.as_bytes(), options);
    assert!(reader.read().unwrap());
    assert!(!reader.read().unwrap());
    assert!(!reader.read().unwrap());
}

#[test]
fn test_duplicate_label_policies() {
    let input = "a:1\tb:2\ta:3\n";

    let mut reader = LtsvReader::from_str(input);
    reader.read().unwrap();
    assert_eq!(reader.get_field("a").unwrap(), "3");
    let labels: Vec<&str> = reader.record().unwrap().labels().collect();
    assert_eq!(labels, vec!["a", "b"]);

    let options = LtsvOptions::new().with_duplicate_labels(DuplicateLabelPolicy::FirstWins);
    let mut reader = LtsvReader::with_options(input.as_bytes(), options);
    reader.read().unwrap();
    assert_eq!(reader.get_field("a").unwrap(), "1");

    let options = LtsvOptions::new().with_duplicate_labels(DuplicateLabelPolicy::Error);
    let mut reader = LtsvReader::with_options(input.as_bytes(), options);
    assert!(matches!(reader.read(), Err(Error::Parse { line: 1, .. })));
}

#[test]
fn test_crlf_and_bom() {
    let mut reader = LtsvReader::from_str("\u{feff}name:Eve\tage:41\r\nname:Fay\tage:7");
    let people: Vec<Person> = reader.records::<Person>().collect::<Result<_>>().unwrap();
    assert_eq!(people[0].name, "Eve");
    assert_eq!(people[1].age, 7);
}

/// Reads the duration in milliseconds, scaling by the `unit` field of the same record.
struct DurationConverter;

impl TypeConverter for DurationConverter {
    fn convert_from_string(
        &self,
        raw: Option<&str>,
        reader: &dyn FieldSource,
        map: &PropertyInfo,
    ) -> Result<Value> {
        let raw = raw.unwrap_or_default();
        let amount: u64 = raw
            .parse()
            .map_err(|_| Error::conversion(map.label(), map.kind(), Some(raw)))?;
        let factor = match reader.get_field("unit") {
            Ok("s") => 1000,
            _ => 1,
        };
        Ok(Value::U64(amount * factor))
    }
}

#[derive(Default, Debug)]
struct Timing {
    path: String,
    millis: u64,
}

impl Mappable for Timing {
    fn configure(map: &mut ClassMapBuilder<Self>) {
        map.default_constructor();
        map.property("path", |t: &mut Timing, v: String| t.path = v);
        map.property("millis", |t: &mut Timing, v: u64| t.millis = v)
            .label("took")
            .converter(Arc::new(DurationConverter));
    }
}

#[test]
fn test_converter_reads_sibling_field() {
    let mut reader = LtsvReader::from_str("path:/a\ttook:2\tunit:s\npath:/b\ttook:15\n");
    let timings: Vec<Timing> = reader.records::<Timing>().collect::<Result<_>>().unwrap();
    assert_eq!(timings[0].millis, 2000);
    assert_eq!(timings[1].path, "/b");
    assert_eq!(timings[1].millis, 15);
}

#[derive(Default, Debug)]
struct Request {
    request_id: String,
    bytes_sent: u64,
}

impl Mappable for Request {
    fn configure(map: &mut ClassMapBuilder<Self>) {
        map.default_constructor();
        map.property("RequestId", |r: &mut Request, v: String| r.request_id = v);
        map.property("BytesSent", |r: &mut Request, v: u64| r.bytes_sent = v);
    }
}

#[test]
fn test_shared_configuration_with_convention_and_override() {
    let mut config = Configuration::new().with_label_convention(LabelConvention::SnakeCase);
    config.override_label::<Request>("BytesSent", "size");
    let config = Arc::new(config);

    let mut first =
        LtsvReader::with_configuration("request_id:r1\tsize:10\n".as_bytes(), Arc::clone(&config));
    first.read().unwrap();
    let req: Request = first.get_record().unwrap();
    assert_eq!(req.request_id, "r1");
    assert_eq!(req.bytes_sent, 10);
    assert!(config.has_class_map::<Request>());

    let mut second = LtsvReader::with_configuration("request_id:r2\n".as_bytes(), config);
    second.read().unwrap();
    assert_eq!(second.get_record::<Request>().unwrap().bytes_sent, 0);
}

#[test]
fn test_bad_override_is_configuration_error() {
    let mut config = Configuration::new();
    config.override_label::<Person>("Nickname", "nick");
    let mut reader = LtsvReader::with_configuration("name:a\n".as_bytes(), Arc::new(config));
    reader.read().unwrap();
    assert!(matches!(
        reader.get_record::<Person>(),
        Err(Error::Configuration { .. })
    ));
}

/// A byte source that counts how many times it has been dropped.
struct TrackedSource {
    inner: &'static [u8],
    drops: Arc<AtomicUsize>,
}

impl Read for TrackedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for TrackedSource {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_close_releases_stream_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = TrackedSource {
        inner: b"name:Alice\tage:30\n",
        drops: Arc::clone(&drops),
    };

    let mut reader = LtsvReader::new(source);
    assert!(reader.read().unwrap());
    reader.close();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    reader.close();
    assert!(reader.is_closed());
    drop(reader);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_read_after_close_is_io_error() {
    let mut reader = LtsvReader::from_str("a:1\na:2\n");
    assert!(reader.read().unwrap());
    reader.close();
    let err = reader.read().unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_direct_typed_access() {
    let mut reader = LtsvReader::from_str(
        "ok:True\tratio:0.5\tday:2024-02-29\tat:2024-02-29T12:00:00+09:00\tgrade:B\n",
    );
    reader.read().unwrap();
    assert!(reader.get_field_as::<bool>("ok").unwrap());
    assert_eq!(reader.get_field_as::<f64>("ratio").unwrap(), 0.5);
    assert_eq!(
        reader.get_field_as::<chrono::NaiveDate>("day").unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    let at = reader
        .get_field_as::<chrono::DateTime<chrono::FixedOffset>>("at")
        .unwrap();
    assert_eq!(at.offset().local_minus_utc(), 9 * 3600);
    assert_eq!(reader.get_field_as::<char>("grade").unwrap(), 'B');
}
