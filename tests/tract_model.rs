//! End-to-end runs of a real ONNX graph through the tract backend
//!
//! The model averages each colour channel over the image and applies a
//! softmax, so the expected distribution follows from the input colour.

#![cfg(feature = "tract")]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use labelvision::{classify_image, BackendType, PredictConfig};
use prost::Message;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tract_onnx::pb::{
    attribute_proto::AttributeType, tensor_proto::DataType, tensor_shape_proto, type_proto,
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorShapeProto,
    TypeProto, ValueInfoProto,
};

fn float_value(name: &str, dims: &[i64]) -> ValueInfoProto {
    let dim = dims
        .iter()
        .map(|&d| tensor_shape_proto::Dimension {
            value: Some(tensor_shape_proto::dimension::Value::DimValue(d)),
            ..Default::default()
        })
        .collect();
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: Some(TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn int_attr(name: &str, value: i64) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        r#type: AttributeType::Int as i32,
        i: value,
        ..Default::default()
    }
}

fn ints_attr(name: &str, values: &[i64]) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        r#type: AttributeType::Ints as i32,
        ints: values.to_vec(),
        ..Default::default()
    }
}

/// `(1, 224, 224, 3)` image to `(1, 3)` softmax over the channel means
fn channel_mean_model() -> Vec<u8> {
    let mean = NodeProto {
        input: vec!["input".to_string()],
        output: vec!["mean".to_string()],
        name: "channel_mean".to_string(),
        op_type: "ReduceMean".to_string(),
        attribute: vec![ints_attr("axes", &[1, 2]), int_attr("keepdims", 0)],
        ..Default::default()
    };
    let softmax = NodeProto {
        input: vec!["mean".to_string()],
        output: vec!["probs".to_string()],
        name: "softmax".to_string(),
        op_type: "Softmax".to_string(),
        attribute: vec![int_attr("axis", 1)],
        ..Default::default()
    };
    let model = ModelProto {
        ir_version: 7,
        opset_import: vec![OperatorSetIdProto { domain: String::new(), version: 13 }],
        graph: Some(GraphProto {
            node: vec![mean, softmax],
            name: "channel_mean_classifier".to_string(),
            input: vec![float_value("input", &[1, 224, 224, 3])],
            output: vec![float_value("probs", &[1, 3])],
            ..Default::default()
        }),
        ..Default::default()
    };
    model.encode_to_vec()
}

fn model_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("best_model.onnx"), channel_mean_model()).unwrap();
    std::fs::write(
        dir.path().join("class_names.json"),
        r#"{"0": "red", "1": "green", "2": "blue"}"#,
    )
    .unwrap();
    dir
}

fn save(image: DynamicImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

fn red_image(dir: &Path) -> PathBuf {
    let red = RgbImage::from_pixel(224, 224, Rgb([255, 0, 0]));
    save(DynamicImage::ImageRgb8(red), dir, "red.png")
}

#[test]
fn test_classify_image_with_tract() {
    let models = model_dir();
    let image = red_image(models.path());

    let result = classify_image(models.path(), &image, PredictConfig::default()).unwrap();

    assert_eq!(result.predicted_class, "red");
    assert!((result.confidence - 0.5761).abs() < 1e-3, "confidence {}", result.confidence);
    assert_eq!(result.all_predictions.len(), 3);
    assert_eq!(result.summary_line(), "RESULT: red (57.6%)");
}

#[test]
fn test_final_model_is_used_without_best_model() {
    let models = model_dir();
    std::fs::rename(
        models.path().join("best_model.onnx"),
        models.path().join("final_model.onnx"),
    )
    .unwrap();
    let blue = RgbImage::from_pixel(300, 200, Rgb([0, 0, 255]));
    let image = save(DynamicImage::ImageRgb8(blue), models.path(), "blue.jpg");
    let config = PredictConfig::builder().backend_type(BackendType::Tract).build().unwrap();

    let result = classify_image(models.path(), &image, config).unwrap();

    assert_eq!(result.predicted_class, "blue");
    assert!(result.confidence > 0.5);
}

#[cfg(feature = "cli")]
mod binary {
    use super::*;
    use std::process::{Command, Output};

    fn predict(model_dir: &Path, image: &Path) -> Output {
        let request = serde_json::json!({
            "model_dir": model_dir,
            "image_path": image,
        })
        .to_string();
        Command::new(env!("CARGO_BIN_EXE_labelvision-predict"))
            .arg(request)
            .env_remove("RUST_LOG")
            .env_remove("LABELVISION_BACKEND")
            .output()
            .unwrap()
    }

    #[test]
    fn test_stdout_report_for_red_image() {
        let models = model_dir();
        let image = red_image(models.path());

        let output = predict(models.path(), &image);

        assert_eq!(
            output.status.code(),
            Some(0),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).unwrap();
        let expected_head = concat!(
            "Loading model...\n",
            "Processing image...\n",
            "Running inference...\n",
            "\n",
            "Prediction: red\n",
            "Confidence: 57.61%\n",
            "\n",
            "All class scores:\n",
            "  red: 57.61%\n",
            "  green: 21.19%\n",
            "  blue: 21.19%\n",
            "\n",
        );
        assert!(stdout.starts_with(expected_head), "stdout: {stdout}");

        let rest = &stdout[expected_head.len()..];
        let (json, last_line) = rest.trim_end().rsplit_once('\n').unwrap();
        assert_eq!(last_line, "RESULT: red (57.6%)");

        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["predicted_class"], "red");
        let scores = value["all_predictions"].as_array().unwrap();
        let classes: Vec<&str> = scores.iter().map(|s| s["class"].as_str().unwrap()).collect();
        assert_eq!(classes, ["red", "green", "blue"]);
        let green = scores[1]["confidence"].as_f64().unwrap();
        let blue = scores[2]["confidence"].as_f64().unwrap();
        assert!((green - blue).abs() < 1e-6);
    }

    #[test]
    fn test_tied_scores_pick_first_class() {
        let models = model_dir();
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 48, Luma([128])));
        let image = save(gray, models.path(), "gray.png");

        let output = predict(models.path(), &image);

        assert_eq!(output.status.code(), Some(0));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Prediction: red\nConfidence: 33.33%\n"), "stdout: {stdout}");
        assert_eq!(stdout.lines().last(), Some("RESULT: red (33.3%)"));
    }
}
