// 该文件是 Kaimozhi （கைமொழி） 项目的一部分。
// tests/pipeline.rs - 处理流程集成测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{cell::RefCell, io::Cursor, path::Path};

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use kaimozhi::{
  catalog::{ClassLabels, Script, SignCatalog, Translation},
  input::Upload,
  model::{Model, PassthroughRemover, Prediction, SignFrame},
  pipeline::{PipelineError, SignContext},
  speech::{SpeechError, SpeechSynthesizer, Voice},
};

const CATALOG: &str = r#"
version = 1
placeholder = "not sign.png"

[[sign]]
label = "class_1  അ - A"
script = "malayalam"
character = "അ"
counterpart = "அ"
reference = "ref/tamil_1.png"

[[sign]]
label = "class_7  ഋ - RU"
script = "malayalam"
character = "ഋ"

[[sign]]
label = "class_2  ஆ"
script = "tamil"
character = "ஆ"
counterpart = "ആ"
reference = "ref/missing.png"
"#;

const LABELS: &str = r#"{
  "0": "class_1  അ - A",
  "1": "class_7  ഋ - RU",
  "2": "class_2  ஆ ",
  "3": "class_99 foo"
}"#;

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [0, 0, 255];
const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Debug, thiserror::Error)]
#[error("分类器不可用")]
struct ClassifierDown;

/// 按图像颜色给出类别：红 0、绿 1、蓝 2、白 3，其他返回越界下标
struct ColorClassifier;

impl Model for ColorClassifier {
  type Input = SignFrame;
  type Output = Prediction;
  type Error = ClassifierDown;

  fn infer(&self, input: &SignFrame) -> Result<Prediction, ClassifierDown> {
    let array = input.to_array();
    let pixel = [array[[0, 64, 64, 0]], array[[0, 64, 64, 1]], array[[0, 64, 64, 2]]];
    let class_id = match pixel.map(|v| v > 0.5) {
      [true, false, false] => 0,
      [false, true, false] => 1,
      [false, false, true] => 2,
      [true, true, true] => 3,
      _ => 9,
    };
    let mut probabilities = vec![0.01f32; 10];
    probabilities[class_id] = 0.91;
    Prediction::from_probabilities(probabilities).ok_or(ClassifierDown)
  }
}

/// 记录调用的语音合成，可以让某种语音失败
#[derive(Default)]
struct FakeSpeech {
  fail_on: Option<Voice>,
  calls: RefCell<Vec<(String, Voice)>>,
}

impl SpeechSynthesizer for &FakeSpeech {
  fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SpeechError> {
    self.calls.borrow_mut().push((text.to_string(), voice));
    if self.fail_on == Some(voice) {
      return Err(SpeechError::BadStatus(503));
    }
    Ok(format!("mp3:{text}").into_bytes())
  }
}

struct Fixture {
  dir: TempDir,
  catalog: SignCatalog,
  labels: ClassLabels,
}

impl Fixture {
  fn new() -> Self {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("ref")).unwrap();
    RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]))
      .save(dir.path().join("ref/tamil_1.png"))
      .unwrap();
    RgbImage::from_pixel(8, 8, Rgb([40, 40, 40]))
      .save(dir.path().join("not sign.png"))
      .unwrap();

    let catalog_path = dir.path().join("signs.toml");
    std::fs::write(&catalog_path, CATALOG).unwrap();
    let catalog = SignCatalog::from_file(&catalog_path).unwrap();
    let labels = ClassLabels::from_json_str(LABELS).unwrap();

    Fixture {
      dir,
      catalog,
      labels,
    }
  }

  fn audio_path(&self) -> std::path::PathBuf {
    self.dir.path().join("audio/output.mp3")
  }

  fn context<'a>(
    &self,
    speech: &'a FakeSpeech,
  ) -> SignContext<ColorClassifier, PassthroughRemover, &'a FakeSpeech> {
    SignContext::new(
      ColorClassifier,
      PassthroughRemover,
      speech,
      self.labels.clone(),
      &self.catalog,
      self.audio_path(),
    )
  }
}

fn upload(name: &str, color: [u8; 3]) -> Upload {
  let mut bytes = Vec::new();
  RgbImage::from_pixel(32, 24, Rgb(color))
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .unwrap();
  Upload::new(name, bytes)
}

#[test]
fn malayalam_sign_is_translated_and_spoken_in_tamil() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let outcome = context.process(&upload("red.png", RED)).unwrap();

  assert_eq!(outcome.predicted_label, "class_1  അ - A");
  assert_eq!(outcome.class_id, 0);
  assert!((outcome.confidence - 0.91).abs() < 1e-6);
  assert_eq!(
    outcome.translation,
    Translation::Mapped {
      character: "அ".to_string(),
      target: Script::Tamil,
    }
  );
  assert!(!outcome.reference.is_placeholder());
  assert_eq!(outcome.reference_image.get_pixel(0, 0).0, [10, 20, 30]);
  assert_eq!(outcome.uploaded.dimensions(), (32, 24));

  assert_eq!(
    outcome.prediction_json(),
    serde_json::json!({ "class_1  അ - A": f64::from(outcome.confidence) })
  );

  let clip = outcome.audio.unwrap();
  assert_eq!(clip.voice, Voice::Tamil);
  assert_eq!(std::fs::read(&clip.path).unwrap(), "mp3:அ".as_bytes());
  assert_eq!(
    speech.calls.borrow().as_slice(),
    &[("அ".to_string(), Voice::Tamil)]
  );
}

#[test]
fn tamil_sign_is_spoken_in_malayalam_with_placeholder_reference() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  // 标签文件中的值带尾随空白，加载时已去除
  let outcome = context.process(&upload("blue.png", BLUE)).unwrap();
  assert_eq!(outcome.predicted_label, "class_2  ஆ");
  assert_eq!(outcome.translation.text(), "ആ");

  // 参考图像文件不存在，回退到占位图像
  assert!(outcome.reference.is_placeholder());
  assert_eq!(
    outcome.reference.path(),
    fixture.dir.path().join("not sign.png").as_path()
  );
  assert_eq!(outcome.reference_image.get_pixel(0, 0).0, [40, 40, 40]);

  assert_eq!(outcome.audio.unwrap().voice, Voice::Malayalam);
}

#[test]
fn letter_without_counterpart_produces_no_audio() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let outcome = context.process(&upload("green.png", GREEN)).unwrap();
  assert_eq!(
    outcome.translation,
    Translation::NoEquivalent {
      source: Script::Malayalam
    }
  );
  assert_eq!(outcome.translation.to_string(), "Can't find");
  assert!(outcome.audio.is_none());
  assert!(speech.calls.borrow().is_empty());
  assert!(!fixture.audio_path().exists());
}

#[test]
fn silent_upload_removes_previous_audio() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  context.process(&upload("red.png", RED)).unwrap();
  assert_eq!(std::fs::read(fixture.audio_path()).unwrap(), "mp3:அ".as_bytes());

  let outcome = context.process(&upload("green.png", GREEN)).unwrap();
  assert!(outcome.audio.is_none());
  assert!(!fixture.audio_path().exists());
  assert_eq!(speech.calls.borrow().len(), 1);
}

#[test]
fn label_outside_catalog_falls_back_to_stripped_text() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let outcome = context.process(&upload("white.png", WHITE)).unwrap();
  assert_eq!(outcome.translation, Translation::Unmapped("foo".to_string()));
  assert!(outcome.reference.is_placeholder());
  // 回退文本中没有马拉雅拉姆文字符
  assert_eq!(outcome.audio.unwrap().voice, Voice::Tamil);
}

#[test]
fn failed_speech_discards_the_whole_upload() {
  let fixture = Fixture::new();
  let speech = FakeSpeech {
    fail_on: Some(Voice::Tamil),
    ..FakeSpeech::default()
  };
  let context = fixture.context(&speech);

  let result = context.process(&upload("red.png", RED));
  assert!(matches!(
    result,
    Err(PipelineError::SpeechError(SpeechError::BadStatus(503)))
  ));

  // 上下文仍可处理下一次上传
  let outcome = context.process(&upload("blue.png", BLUE)).unwrap();
  assert_eq!(outcome.audio.unwrap().voice, Voice::Malayalam);
}

#[test]
fn failed_speech_leaves_no_stale_audio() {
  let fixture = Fixture::new();
  let speech = FakeSpeech {
    fail_on: Some(Voice::Malayalam),
    ..FakeSpeech::default()
  };
  let context = fixture.context(&speech);

  context.process(&upload("red.png", RED)).unwrap();
  assert!(fixture.audio_path().exists());

  assert!(context.process(&upload("blue.png", BLUE)).is_err());
  assert!(!fixture.audio_path().exists());
}

#[test]
fn undecodable_upload_is_contained() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let result = context.process(&Upload::new("notes.png", b"not a png".to_vec()));
  assert!(matches!(result, Err(PipelineError::DecodeError { .. })));

  assert!(context.process(&upload("red.png", RED)).is_ok());
}

#[test]
fn class_without_label_is_an_error() {
  let fixture = Fixture::new();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let result = context.process(&upload("purple.png", [200, 0, 200]));
  assert!(matches!(result, Err(PipelineError::UnknownClass(9))));
}

#[test]
fn missing_placeholder_fails_the_upload() {
  let fixture = Fixture::new();
  std::fs::remove_file(fixture.dir.path().join("not sign.png")).unwrap();
  let speech = FakeSpeech::default();
  let context = fixture.context(&speech);

  let result = context.process(&upload("blue.png", BLUE));
  match result {
    Err(PipelineError::ReferenceError { path, .. }) => {
      assert_eq!(path, fixture.dir.path().join("not sign.png"));
    }
    other => panic!("unexpected result: {:?}", other.map(|o| o.predicted_label)),
  }
  assert!(speech.calls.borrow().is_empty());
}

#[test]
fn every_builtin_label_has_one_owner() {
  let catalog = SignCatalog::builtin(Path::new("/assets")).unwrap();
  let translator = catalog.translator();
  for entry in catalog.entries() {
    assert_eq!(translator.owners(&entry.label), 1, "{}", entry.label);
  }
}
