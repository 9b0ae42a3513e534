// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output sinks: key-value, JSON lines, and CSV serialisation of decoded records.

use std::io::Write;

use telemetria::core::record::{escape, DataRecord, DataValue, FormatHint};
use telemetria::core::sink::RecordSink;

fn render_double(value: f64, hint: Option<FormatHint>) -> String {
    match hint {
        Some(FormatHint::Precision(digits)) => format!("{:.*}", digits as usize, value),
        _ => format!("{}", value),
    }
}

fn render_int(value: i64, hint: Option<FormatHint>) -> String {
    match hint {
        Some(FormatHint::Hex(digits)) => format!("{:0>1$x}", value, digits as usize),
        _ => format!("{}", value),
    }
}

/// Space-separated `key=value` lines.
pub struct KvSink {
    out: Box<dyn Write + Send>,
    line: String,
}

impl KvSink {
    pub fn new(out: Box<dyn Write + Send>) -> KvSink {
        KvSink { out, line: String::new() }
    }

    fn render_value(&mut self, value: &DataValue, hint: Option<FormatHint>) {
        match value {
            DataValue::Integer(v) => self.print_int(*v, hint),
            DataValue::Double(v) => self.print_double(*v, hint),
            DataValue::Text(v) => {
                let escaped = escape::escape_delimited(v, ' ').into_owned();
                self.print_string(&escaped);
            }
            DataValue::Record(v) => {
                self.line.push('{');
                for (i, field) in v.fields().iter().enumerate() {
                    if i > 0 {
                        self.line.push(' ');
                    }
                    self.line.push_str(&field.key);
                    self.line.push('=');
                    self.render_value(&field.value, field.hint);
                }
                self.line.push('}');
            }
            DataValue::Array(v) => self.print_array(v),
        }
    }
}

impl RecordSink for KvSink {
    fn print_record(&mut self, record: &DataRecord) {
        self.line.clear();
        for (i, field) in record.fields().iter().enumerate() {
            if i > 0 {
                self.line.push(' ');
            }
            self.line.push_str(&field.key);
            self.line.push('=');
            self.render_value(&field.value, field.hint);
        }
        self.line.push('\n');
        let _ = self.out.write_all(self.line.as_bytes());
    }

    fn print_array(&mut self, values: &[DataValue]) {
        self.line.push('[');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.line.push(',');
            }
            self.render_value(value, None);
        }
        self.line.push(']');
    }

    fn print_string(&mut self, value: &str) {
        self.line.push_str(value);
    }

    fn print_double(&mut self, value: f64, hint: Option<FormatHint>) {
        self.line.push_str(&render_double(value, hint));
    }

    fn print_int(&mut self, value: i64, hint: Option<FormatHint>) {
        self.line.push_str(&render_int(value, hint));
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

/// One JSON object per line.
pub struct JsonSink {
    out: Box<dyn Write + Send>,
    line: String,
}

impl JsonSink {
    pub fn new(out: Box<dyn Write + Send>) -> JsonSink {
        JsonSink { out, line: String::new() }
    }

    fn render_value(&mut self, value: &DataValue, hint: Option<FormatHint>) {
        match value {
            DataValue::Integer(v) => self.print_int(*v, hint),
            DataValue::Double(v) => self.print_double(*v, hint),
            DataValue::Text(v) => {
                self.line.push('"');
                self.line.push_str(&escape::escape_json(v));
                self.line.push('"');
            }
            DataValue::Record(v) => {
                self.line.push('{');
                for (i, field) in v.fields().iter().enumerate() {
                    if i > 0 {
                        self.line.push(',');
                    }
                    self.line.push('"');
                    self.line.push_str(&escape::escape_json(&field.key));
                    self.line.push_str("\":");
                    self.render_value(&field.value, field.hint);
                }
                self.line.push('}');
            }
            DataValue::Array(v) => self.print_array(v),
        }
    }
}

impl RecordSink for JsonSink {
    fn print_record(&mut self, record: &DataRecord) {
        self.line.clear();
        self.line.push('{');
        for (i, field) in record.fields().iter().enumerate() {
            if i > 0 {
                self.line.push(',');
            }
            self.line.push('"');
            self.line.push_str(&escape::escape_json(&field.key));
            self.line.push_str("\":");
            self.render_value(&field.value, field.hint);
        }
        self.line.push_str("}\n");
        let _ = self.out.write_all(self.line.as_bytes());
    }

    fn print_array(&mut self, values: &[DataValue]) {
        self.line.push('[');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.line.push(',');
            }
            self.render_value(value, None);
        }
        self.line.push(']');
    }

    fn print_string(&mut self, value: &str) {
        self.line.push('"');
        self.line.push_str(&escape::escape_json(value));
        self.line.push('"');
    }

    fn print_double(&mut self, value: f64, hint: Option<FormatHint>) {
        if value.is_finite() {
            self.line.push_str(&render_double(value, hint));
        }
        else {
            self.line.push_str("null");
        }
    }

    fn print_int(&mut self, value: i64, hint: Option<FormatHint>) {
        // Hex hints are presentation only; JSON carries the plain number.
        let _ = hint;
        self.line.push_str(&format!("{}", value));
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

/// Comma-separated values over a fixed column set, negotiated from the device field lists at
/// startup.
pub struct CsvSink {
    out: Box<dyn Write + Send>,
    columns: Vec<String>,
    wrote_header: bool,
}

impl CsvSink {
    pub fn new(out: Box<dyn Write + Send>, columns: Vec<String>) -> CsvSink {
        CsvSink { out, columns, wrote_header: false }
    }

    fn render_field(&self, record: &DataRecord, column: &str) -> String {
        match record.get(column) {
            Some(DataValue::Integer(v)) => {
                let hint = record
                    .fields()
                    .iter()
                    .find(|f| f.key == column)
                    .and_then(|f| f.hint);
                render_int(*v, hint)
            }
            Some(DataValue::Double(v)) => {
                let hint = record
                    .fields()
                    .iter()
                    .find(|f| f.key == column)
                    .and_then(|f| f.hint);
                render_double(*v, hint)
            }
            Some(DataValue::Text(v)) => escape::escape_delimited(v, ',').into_owned(),
            Some(_) => String::from("*"),
            None => String::new(),
        }
    }
}

impl RecordSink for CsvSink {
    fn print_record(&mut self, record: &DataRecord) {
        if !self.wrote_header {
            let _ = writeln!(self.out, "{}", self.columns.join(","));
            self.wrote_header = true;
        }

        let cells: Vec<String> =
            self.columns.iter().map(|column| self.render_field(record, column)).collect();
        let _ = writeln!(self.out, "{}", cells.join(","));
    }

    fn print_array(&mut self, _values: &[DataValue]) {}

    fn print_string(&mut self, value: &str) {
        let _ = write!(self.out, "{}", escape::escape_delimited(value, ','));
    }

    fn print_double(&mut self, value: f64, hint: Option<FormatHint>) {
        let _ = write!(self.out, "{}", render_double(value, hint));
    }

    fn print_int(&mut self, value: i64, hint: Option<FormatHint>) {
        let _ = write!(self.out, "{}", render_int(value, hint));
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A Write handle into a shared buffer, so tests can inspect sink output.
    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn record() -> DataRecord {
        let mut record = DataRecord::new();
        record
            .push("model", "Model", "Acme-1")
            .push("id", "Id", 7u8)
            .push_hinted("temperature_C", "Temperature", 21.5f64, FormatHint::Precision(1))
            .push("note", "Note", "has space");
        record
    }

    #[test]
    fn verify_kv_output() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = KvSink::new(Box::new(SharedBuf(buf.clone())));
        sink.print_record(&record());

        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "model=Acme-1 id=7 temperature_C=21.5 note=\"has space\"\n");
    }

    #[test]
    fn verify_json_output() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = JsonSink::new(Box::new(SharedBuf(buf.clone())));
        sink.print_record(&record());

        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(
            text,
            "{\"model\":\"Acme-1\",\"id\":7,\"temperature_C\":21.5,\"note\":\"has space\"}\n"
        );
    }

    #[test]
    fn verify_csv_output() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let columns = vec!["model".to_string(), "id".to_string(), "missing".to_string()];
        let mut sink = CsvSink::new(Box::new(SharedBuf(buf.clone())), columns);
        sink.print_record(&record());
        sink.print_record(&record());

        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "model,id,missing");
        assert_eq!(lines[1], "Acme-1,7,");
        assert_eq!(lines[1], lines[2]);
    }
}
