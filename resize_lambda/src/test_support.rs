//! Fixtures shared by the unit tests.

use std::io::Cursor;

use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use serde_json::{json, Value};

/// An `ObjectCreated:Put` record shaped like the S3 console's test event.
pub(crate) fn s3_record_json(bucket: Option<&str>, key: Option<&str>) -> Value {
    json!({
        "eventVersion": "2.1",
        "eventSource": "aws:s3",
        "awsRegion": "us-east-1",
        "eventTime": "2024-05-01T12:00:00.000Z",
        "eventName": "ObjectCreated:Put",
        "userIdentity": { "principalId": "EXAMPLE" },
        "requestParameters": { "sourceIPAddress": "127.0.0.1" },
        "responseElements": {
            "x-amz-request-id": "EXAMPLE123456789",
            "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
        },
        "s3": {
            "s3SchemaVersion": "1.0",
            "configurationId": "resize-on-upload",
            "bucket": {
                "name": bucket,
                "ownerIdentity": { "principalId": "EXAMPLE" },
                "arn": "arn:aws:s3:::example-bucket"
            },
            "object": {
                "key": key,
                "size": 1024,
                "eTag": "0123456789abcdef0123456789abcdef",
                "sequencer": "0A1B2C3D4E5F678901"
            }
        }
    })
}

pub(crate) fn s3_record(bucket: Option<&str>, key: Option<&str>) -> S3EventRecord {
    serde_json::from_value(s3_record_json(bucket, key)).unwrap()
}

pub(crate) fn s3_event(objects: &[(&str, &str)]) -> S3Event {
    let records: Vec<Value> = objects
        .iter()
        .map(|(bucket, key)| s3_record_json(Some(bucket), Some(key)))
        .collect();
    serde_json::from_value(json!({ "Records": records })).unwrap()
}

/// An opaque RGB gradient, so resizing and encoding have real work to do.
pub(crate) fn rgb_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

pub(crate) fn rgba_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, ((x * y) % 256) as u8])
    }))
}

pub(crate) fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&rgb_image(width, height), ImageFormat::Png)
}
