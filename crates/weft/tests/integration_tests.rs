// Weft - Flat Record Binding Engine
//
// Copyright (c) 2025 Weft Contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end scenarios driving compiled streams over real tokenizers.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use weft::{
    create_reader, create_writer, Aggregation, ClassDef, FieldConfig, GroupConfig, Justify,
    Occurs, Param, RecordConfig, SegmentConfig, Stream, StreamBuilder, StreamFormat,
    StreamReader, StreamWriter, TypeRef, Value, WeftErrorKind,
};

/// Collects writer output through a shared buffer.
struct Tee(Rc<RefCell<Vec<u8>>>);

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn reader_over(stream: Arc<Stream>, input: &'static str) -> StreamReader {
    create_reader(stream, Box::new(input.as_bytes())).unwrap()
}

fn writer_into(stream: Arc<Stream>) -> (StreamWriter, Rc<RefCell<Vec<u8>>>) {
    let shared: Rc<RefCell<Vec<u8>>> = Default::default();
    let writer = create_writer(stream, Box::new(Tee(shared.clone()))).unwrap();
    (writer, shared)
}

fn output_of(shared: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(shared.borrow().clone()).unwrap()
}

// ==================== Delimited collection round-trip ====================

fn batch_stream() -> Arc<Stream> {
    StreamBuilder::new("batches", StreamFormat::Delimited)
        .class(
            ClassDef::new("Batch")
                .property("list", TypeRef::List)
                .property("array", TypeRef::List),
        )
        .record(
            RecordConfig::new("batch")
                .bound_to("Batch")
                .child(FieldConfig::new("list").occurs(1, Occurs::Count(3)))
                .child(FieldConfig::new("array").typed("int").occurs(1, Occurs::Count(4))),
        )
        .build()
        .unwrap()
}

#[test]
fn delimited_collection_round_trip() {
    let stream = batch_stream();
    let mut reader = reader_over(stream.clone(), "George,Gary,Jon,1,2,3,4\n");

    let value = reader.read().unwrap().unwrap();
    let bean = value.as_bean().unwrap();
    assert_eq!(
        bean.get("list"),
        Some(&Value::List(vec![
            Value::from("George"),
            Value::from("Gary"),
            Value::from("Jon"),
        ]))
    );
    assert_eq!(
        bean.get("array"),
        Some(&Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
        ]))
    );
    assert_eq!(reader.read().unwrap(), None);

    let (mut writer, out) = writer_into(stream);
    writer.write(&value).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "George,Gary,Jon,1,2,3,4\n");
}

#[test]
fn delimited_collection_greedy_leaves_minimum() {
    // Two tokens: the list may take at most one so the array keeps its
    // minimum occurrence.
    let stream = batch_stream();
    let mut reader = reader_over(stream, "George,7\n");
    let value = reader.read().unwrap().unwrap();
    let bean = value.as_bean().unwrap();
    assert_eq!(
        bean.get("list"),
        Some(&Value::List(vec![Value::from("George")]))
    );
    assert_eq!(bean.get("array"), Some(&Value::List(vec![Value::Int(7)])));
}

// ==================== Back-fill and fixed-length padding ====================

fn car_class() -> ClassDef {
    ClassDef::new("Car")
        .property("id", TypeRef::Int)
        .property("color", TypeRef::String)
        .property("model", TypeRef::String)
}

fn car_value() -> Value {
    let mut bean = weft::Bean::new("Car");
    bean.set("id", Value::Int(1));
    bean.set("model", Value::from("model"));
    Value::Bean(bean)
}

#[test]
fn delimited_internal_backfill() {
    let stream = StreamBuilder::new("cars", StreamFormat::Delimited)
        .class(car_class())
        .record(
            RecordConfig::new("car")
                .bound_to("Car")
                .child(FieldConfig::new("id").typed("int"))
                .child(FieldConfig::new("color"))
                .child(FieldConfig::new("model")),
        )
        .build()
        .unwrap();

    let (mut writer, out) = writer_into(stream);
    writer.write(&car_value()).unwrap();
    writer.close().unwrap();
    // The unset middle position back-fills; nothing trails.
    assert_eq!(output_of(&out), "1,,model\n");
}

#[test]
fn delimited_trailing_positions_trimmed() {
    let stream = StreamBuilder::new("cars", StreamFormat::Delimited)
        .class(car_class())
        .record(
            RecordConfig::new("car")
                .bound_to("Car")
                .child(FieldConfig::new("id").typed("int"))
                .child(FieldConfig::new("model"))
                .child(FieldConfig::new("color")),
        )
        .build()
        .unwrap();

    let (mut writer, out) = writer_into(stream);
    writer.write(&car_value()).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "1,model\n");
}

fn fixed_car_stream() -> Arc<Stream> {
    StreamBuilder::new("cars", StreamFormat::FixedLength)
        .class(car_class())
        .record(
            RecordConfig::new("car")
                .bound_to("Car")
                .child({
                    let mut f = FieldConfig::new("id").typed("int").at(0, 3);
                    f.justify = Justify::Right;
                    f
                })
                .child(FieldConfig::new("color").at(3, 5))
                .child(FieldConfig::new("model").at(8, 5)),
        )
        .build()
        .unwrap()
}

#[test]
fn fixed_length_pads_missing_fields() {
    let stream = fixed_car_stream();
    let (mut writer, out) = writer_into(stream);
    writer.write(&car_value()).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "  1     model\n");
}

#[test]
fn fixed_length_record_width_is_sum_of_field_widths() {
    let stream = fixed_car_stream();
    let (mut writer, out) = writer_into(stream);
    writer.write(&car_value()).unwrap();
    writer.close().unwrap();
    let line = output_of(&out);
    assert_eq!(line.trim_end_matches('\n').chars().count(), 3 + 5 + 5);
}

#[test]
fn fixed_length_round_trip() {
    let stream = fixed_car_stream();
    let mut reader = reader_over(stream.clone(), "  1     model\n");
    let value = reader.read().unwrap().unwrap();
    let bean = value.as_bean().unwrap();
    assert_eq!(bean.get("id"), Some(&Value::Int(1)));
    assert_eq!(bean.get("model"), Some(&Value::from("model")));
    assert_eq!(bean.get("color"), None);

    let (mut writer, out) = writer_into(stream);
    writer.write(&value).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "  1     model\n");
}

// ==================== Escape-decoding fields ====================

#[test]
fn escape_string_parse_with_null_escaping() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .escape_strings(true)
        .record(RecordConfig::new("r").child(FieldConfig::new("v")))
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "a\\\\b\\nc\\0d\n");
    let value = reader.read().unwrap().unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.get("v"), Some(&Value::from("a\\b\nc\0d")));
}

#[test]
fn escape_string_parse_without_null_escaping() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .escape_strings(false)
        .record(RecordConfig::new("r").child(FieldConfig::new("v")))
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "\\0\n");
    let value = reader.read().unwrap().unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.get("v"), Some(&Value::from("0")));
}

#[test]
fn escape_string_format_is_unsupported() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .escape_strings(true)
        .record(RecordConfig::new("r").child(FieldConfig::new("v")))
        .build()
        .unwrap();
    let (mut writer, _) = writer_into(stream);
    let mut entries = std::collections::BTreeMap::new();
    entries.insert("v".to_string(), Value::from("x"));
    let err = writer.write(&Value::Map(entries)).unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Unsupported);
}

// ==================== XML time handler ====================

#[test]
fn xml_time_non_lenient_with_zone() {
    let stream = StreamBuilder::new("s", StreamFormat::Xml)
        .record(RecordConfig::new("event").child(FieldConfig::new("at").typed("time")))
        .build()
        .unwrap();
    let mut reader = reader_over(
        stream,
        "<stream><event><at>13:20:00-05:00</at></event></stream>",
    );
    let value = reader.read().unwrap().unwrap();
    let map = value.as_map().unwrap();
    let at = map.get("at").unwrap().as_datetime().unwrap();
    assert_eq!(at.timestamp.format("%H:%M:%S").to_string(), "13:20:00");
    // The date portion is the Unix epoch; the offset is recorded in full.
    assert_eq!(at.timestamp.format("%Y-%m-%d").to_string(), "1970-01-01");
    assert_eq!(at.offset_seconds(), -5 * 3600);
}

// ==================== Constructor selection ====================

#[test]
fn best_constructor_prefers_assignable_candidate() {
    // Constructors (int) and (string) with candidate ["hi"]: the string
    // constructor scores +1 against the int constructor's -100.
    let class = ClassDef::new("Choice")
        .constructor(vec![Param::new("n", TypeRef::Int)])
        .constructor(vec![Param::new("s", TypeRef::String)]);
    let registry = weft::ClassRegistry::new();
    let picked = weft::factory::best_constructor(&registry, &class, &[Value::from("hi")]);
    assert_eq!(picked, Some(1));
}

#[test]
fn constructor_arguments_drive_instantiation() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .class(
            ClassDef::new("Point")
                .property("label", TypeRef::String)
                .constructor(vec![
                    Param::new("x", TypeRef::Int),
                    Param::new("y", TypeRef::Int),
                ]),
        )
        .record(
            RecordConfig::new("point")
                .bound_to("Point")
                .child(FieldConfig::new("x").typed("int").ctor(0))
                .child(FieldConfig::new("y").typed("int").ctor(1))
                .child(FieldConfig::new("label")),
        )
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "3,4,origin-ish\n");
    let value = reader.read().unwrap().unwrap();
    let bean = value.as_bean().unwrap();
    assert_eq!(bean.get("x"), Some(&Value::Int(3)));
    assert_eq!(bean.get("y"), Some(&Value::Int(4)));
    assert_eq!(bean.get("label"), Some(&Value::from("origin-ish")));
}

#[test]
fn non_contiguous_constructor_arguments_rejected() {
    let err = StreamBuilder::new("s", StreamFormat::Delimited)
        .class(ClassDef::new("Point").constructor(vec![
            Param::new("x", TypeRef::Int),
            Param::new("y", TypeRef::Int),
        ]))
        .record(
            RecordConfig::new("point")
                .bound_to("Point")
                .child(FieldConfig::new("x").typed("int").ctor(0))
                .child(FieldConfig::new("y").typed("int").ctor(2)),
        )
        .build()
        .unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Config);
    assert!(err.message.contains("not contiguous"));
    assert!(err.message.contains("Point"));
}

// ==================== Record dispatch ====================

fn dispatch_stream(unordered: bool, min_r1: usize) -> Arc<Stream> {
    let mut builder = StreamBuilder::new("s", StreamFormat::Delimited).class(
        ClassDef::new("Row")
            .property("kind", TypeRef::String)
            .property("num", TypeRef::Int)
            .property("name", TypeRef::String),
    );
    if unordered {
        builder = builder.unordered();
    }
    for (record, literal) in [("R1", "R1"), ("R2", "R2"), ("R3", "R3")] {
        let mut config = RecordConfig::new(record)
            .bound_to("Row")
            .child(FieldConfig::new("kind").rid_literal(literal))
            .child(FieldConfig::new("num").typed("int"))
            .child(FieldConfig::new("name"));
        if record == "R1" {
            config = config.occurs(min_r1, Occurs::Unbounded);
        }
        builder = builder.record(config);
    }
    builder.build().unwrap()
}

#[test]
fn unordered_group_accepts_any_declaration_order() {
    let stream = dispatch_stream(true, 0);
    let mut reader = reader_over(stream, "R2,2,name2\nR1,1,name1\n");

    let first = reader.read().unwrap().unwrap();
    assert_eq!(reader.record_name(), Some("R2"));
    assert_eq!(first.as_bean().unwrap().get("num"), Some(&Value::Int(2)));

    let second = reader.read().unwrap().unwrap();
    assert_eq!(reader.record_name(), Some("R1"));
    assert_eq!(
        second.as_bean().unwrap().get("name"),
        Some(&Value::from("name1"))
    );
    assert_eq!(reader.read().unwrap(), None);
}

#[test]
fn sequential_group_rejects_out_of_order_records() {
    let stream = dispatch_stream(false, 1);
    let mut reader = reader_over(stream, "R2,2,name2\nR1,1,name1\n");
    let err = reader.read().unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Occurrence);
    assert!(err.message.contains("R1"));
}

#[test]
fn sequential_group_accepts_declared_order() {
    let stream = dispatch_stream(false, 1);
    let mut reader = reader_over(stream, "R1,1,name1\nR2,2,name2\n");
    assert!(reader.read().unwrap().is_some());
    assert!(reader.read().unwrap().is_some());
    assert_eq!(reader.read().unwrap(), None);
}

#[test]
fn sequential_group_repeats_as_a_unit() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .group(
            GroupConfig::new("batch")
                .occurs(0, Occurs::Unbounded)
                .child(
                    RecordConfig::new("header")
                        .occurs(1, Occurs::Count(1))
                        .child(FieldConfig::new("kind").rid_literal("H"))
                        .child(FieldConfig::new("id").typed("int")),
                )
                .child(
                    RecordConfig::new("detail")
                        .occurs(0, Occurs::Unbounded)
                        .child(FieldConfig::new("kind").rid_literal("D"))
                        .child(FieldConfig::new("payload")),
                ),
        )
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "H,1\nD,a\nD,b\nH,2\nD,c\n");
    let mut kinds = Vec::new();
    while let Some(_) = reader.read().unwrap() {
        kinds.push(reader.record_name().unwrap().to_string());
    }
    assert_eq!(kinds, vec!["header", "detail", "detail", "header", "detail"]);
}

#[test]
fn missing_required_record_detected_at_end() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .record(
            RecordConfig::new("header")
                .occurs(1, Occurs::Count(1))
                .child(FieldConfig::new("kind").rid_literal("H")),
        )
        .record(
            RecordConfig::new("trailer")
                .occurs(1, Occurs::Count(1))
                .child(FieldConfig::new("kind").rid_literal("T")),
        )
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "H\n");
    reader.read().unwrap().unwrap();
    let err = reader.read().unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Occurrence);
    assert!(err.message.contains("trailer"));
}

// ==================== Unidentified records ====================

#[test]
fn unidentified_record_fails_by_default() {
    let stream = dispatch_stream(true, 0);
    let mut reader = reader_over(stream, "XX,1,huh\n");
    let err = reader.read().unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Unidentified);
}

#[test]
fn unidentified_record_skipped_when_configured() {
    let stream = {
        let mut builder = StreamBuilder::new("s", StreamFormat::Delimited)
            .on_unidentified(weft::UnidentifiedPolicy::Skip)
            .class(
                ClassDef::new("Row")
                    .property("kind", TypeRef::String)
                    .property("num", TypeRef::Int)
                    .property("name", TypeRef::String),
            );
        builder = builder.record(
            RecordConfig::new("R1")
                .bound_to("Row")
                .child(FieldConfig::new("kind").rid_literal("R1"))
                .child(FieldConfig::new("num").typed("int"))
                .child(FieldConfig::new("name")),
        );
        builder.build().unwrap()
    };
    let mut reader = reader_over(stream, "XX,9,skipme\nR1,1,kept\n");
    let value = reader.read().unwrap().unwrap();
    assert_eq!(
        value.as_bean().unwrap().get("name"),
        Some(&Value::from("kept"))
    );
}

// ==================== Error handler aggregation ====================

#[test]
fn conversion_errors_reported_and_reader_continues() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .class(ClassDef::new("Row").property("num", TypeRef::Int))
        .record(
            RecordConfig::new("row")
                .bound_to("Row")
                .child(FieldConfig::new("num").typed("int")),
        )
        .build()
        .unwrap();

    let seen: Arc<std::sync::Mutex<Vec<String>>> = Default::default();
    let sink = seen.clone();
    let mut reader = create_reader(stream, Box::new("oops\n7\n".as_bytes()))
        .unwrap()
        .with_error_handler(Box::new(move |err| {
            sink.lock().unwrap().push(err.message.clone());
        }));

    let value = reader.read().unwrap().unwrap();
    assert_eq!(value.as_bean().unwrap().get("num"), Some(&Value::Int(7)));
    assert_eq!(reader.read().unwrap(), None);

    let messages = seen.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("field error"));
}

#[test]
fn conversion_error_carries_record_and_field() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .class(ClassDef::new("Row").property("num", TypeRef::Int))
        .record(
            RecordConfig::new("row")
                .bound_to("Row")
                .child(FieldConfig::new("num").typed("int")),
        )
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "bad\n");
    let err = reader.read().unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Conversion);
    assert_eq!(err.record.as_deref(), Some("row"));
    assert_eq!(err.field.as_deref(), Some("num"));
    assert_eq!(err.line, 1);
}

// ==================== Segments and nesting ====================

#[test]
fn xml_nested_segment_round_trip() {
    let stream = StreamBuilder::new("people", StreamFormat::Xml)
        .class(
            ClassDef::new("Person")
                .property("name", TypeRef::String)
                .property("address", TypeRef::Class("Address".to_string())),
        )
        .class(
            ClassDef::new("Address")
                .property("city", TypeRef::String)
                .property("zip", TypeRef::String),
        )
        .record(
            RecordConfig::new("person")
                .bound_to("Person")
                .child(FieldConfig::new("name"))
                .child(
                    SegmentConfig::new("address")
                        .bound_to("Address")
                        .child(FieldConfig::new("city"))
                        .child(FieldConfig::new("zip")),
                ),
        )
        .build()
        .unwrap();

    let mut reader = reader_over(
        stream.clone(),
        "<stream><person><name>Ada</name>\
         <address><city>Oslo</city><zip>0150</zip></address></person></stream>",
    );
    let value = reader.read().unwrap().unwrap();
    let person = value.as_bean().unwrap();
    let address = person.get("address").unwrap().as_bean().unwrap();
    assert_eq!(address.get("city"), Some(&Value::from("Oslo")));

    let (mut writer, out) = writer_into(stream);
    writer.write(&value).unwrap();
    writer.close().unwrap();
    let xml = output_of(&out);
    assert!(xml.contains("<city>Oslo</city>"));
    assert!(xml.contains("<person>"));
}

#[test]
fn delimited_repeating_segment_collects_into_list() {
    let stream = StreamBuilder::new("orders", StreamFormat::Delimited)
        .class(
            ClassDef::new("Order")
                .property("id", TypeRef::Int)
                .property("items", TypeRef::List),
        )
        .class(
            ClassDef::new("Item")
                .property("sku", TypeRef::String)
                .property("qty", TypeRef::Int),
        )
        .record(
            RecordConfig::new("order")
                .bound_to("Order")
                .child(FieldConfig::new("id").typed("int"))
                .child(
                    SegmentConfig::new("items")
                        .bound_to("Item")
                        .aggregated(Aggregation::List)
                        .occurs(0, Occurs::Count(3))
                        .child(FieldConfig::new("sku"))
                        .child(FieldConfig::new("qty").typed("int")),
                ),
        )
        .build()
        .unwrap();

    let mut reader = reader_over(stream.clone(), "7,apple,2,pear,5\n");
    let value = reader.read().unwrap().unwrap();
    let order = value.as_bean().unwrap();
    let items = order.get("items").unwrap().as_list().unwrap();
    assert_eq!(items.len(), 2);
    let first = items[0].as_bean().unwrap();
    assert_eq!(first.get("sku"), Some(&Value::from("apple")));
    assert_eq!(first.get("qty"), Some(&Value::Int(2)));

    let (mut writer, out) = writer_into(stream);
    writer.write(&value).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "7,apple,2,pear,5\n");
}

// ==================== Unbound records ====================

#[test]
fn unbound_record_unmarshals_to_map() {
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .record(
            RecordConfig::new("pair")
                .child(FieldConfig::new("key"))
                .child(FieldConfig::new("value").typed("int")),
        )
        .build()
        .unwrap();
    let mut reader = reader_over(stream, "answer,42\n");
    let value = reader.read().unwrap().unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.get("key"), Some(&Value::from("answer")));
    assert_eq!(map.get("value"), Some(&Value::Int(42)));
}

// ==================== Named writes ====================

#[test]
fn write_named_selects_record() {
    let stream = dispatch_stream(true, 0);
    let (mut writer, out) = writer_into(stream);
    let mut bean = weft::Bean::new("Row");
    bean.set("kind", Value::from("R2"));
    bean.set("num", Value::Int(9));
    bean.set("name", Value::from("direct"));
    writer.write_named("R2", &Value::Bean(bean)).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "R2,9,direct\n");
}

#[test]
fn literal_identifier_filled_on_write() {
    let stream = dispatch_stream(true, 0);
    let (mut writer, out) = writer_into(stream);
    let mut bean = weft::Bean::new("Row");
    bean.set("num", Value::Int(9));
    bean.set("name", Value::from("n"));
    // The identifier member is unset; its literal fills the position.
    writer.write_named("R1", &Value::Bean(bean)).unwrap();
    writer.close().unwrap();
    assert_eq!(output_of(&out), "R1,9,n\n");
}

#[test]
fn write_missing_identifier_is_writer_error() {
    // Pattern identifiers have no literal fallback; a missing value cannot
    // be marshalled.
    let stream = StreamBuilder::new("s", StreamFormat::Delimited)
        .class(
            ClassDef::new("Row")
                .property("kind", TypeRef::String)
                .property("num", TypeRef::Int),
        )
        .record(
            RecordConfig::new("a")
                .bound_to("Row")
                .child(FieldConfig::new("kind").rid_regex("^A"))
                .child(FieldConfig::new("num").typed("int")),
        )
        .record(
            RecordConfig::new("b")
                .bound_to("Row")
                .child(FieldConfig::new("kind").rid_regex("^B"))
                .child(FieldConfig::new("num").typed("int")),
        )
        .build()
        .unwrap();
    let (mut writer, _) = writer_into(stream);
    let mut bean = weft::Bean::new("Row");
    bean.set("num", Value::Int(9));
    let err = writer.write_named("a", &Value::Bean(bean)).unwrap_err();
    assert_eq!(err.kind, WeftErrorKind::Writer);
    assert!(err.message.contains("kind"));
}
