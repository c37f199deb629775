use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clustering::domain::cluster_assignment::Termination;
use crate::clustering::domain::face_clusterer::FaceClusterer;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::rendering::domain::box_renderer::BoxRenderer;
use crate::rendering::domain::image_reader::ImageReader;
use crate::rendering::domain::image_writer::ImageWriter;
use crate::rendering::domain::palette::{Color, PaletteAssigner};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::embedding::EmbeddingSet;
use crate::shared::settings::ClusterSettings;

/// One detected face with its cluster and drawing color.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusteredFace {
    pub index: usize,
    pub bounding_box: BoundingBox,
    pub label: u32,
    pub color: Color,
}

/// Result of one run, suitable for JSON export.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterReport {
    pub faces: Vec<ClusteredFace>,
    pub cluster_count: u32,
    pub iterations: u32,
    pub termination: Termination,
    /// Seed that drove visitation order and tie-breaks; replaying it
    /// reproduces the labels.
    pub seed: u64,
}

/// Single-image clustering pipeline:
/// read → detect → embed → graph → cluster → color → draw → write.
pub struct ClusterFacesUseCase {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    clusterer: FaceClusterer,
    renderer: Box<dyn BoxRenderer>,
    image_writer: Box<dyn ImageWriter>,
    settings: ClusterSettings,
    logger: Box<dyn PipelineLogger>,
}

impl ClusterFacesUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        clusterer: FaceClusterer,
        renderer: Box<dyn BoxRenderer>,
        image_writer: Box<dyn ImageWriter>,
        settings: ClusterSettings,
    ) -> Self {
        Self {
            reader,
            detector,
            embedder,
            clusterer,
            renderer,
            image_writer,
            settings,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<ClusterReport, Box<dyn std::error::Error>> {
        let stage = Instant::now();
        let mut frame = self.reader.read(input_path)?;
        self.logger.timing("read", elapsed_ms(stage));

        self.logger.info("Detecting faces...");
        let stage = Instant::now();
        let faces = self.detector.detect(&frame)?;
        self.logger.timing("detect", elapsed_ms(stage));
        self.logger.info(&format!("   Found {} faces in image", faces.len()));
        self.logger.metric("faces", faces.len() as f64);

        self.logger.info("Recognizing faces...");
        let stage = Instant::now();
        let embeddings = self.embedder.embed_all(&frame, &faces)?;
        let embeddings = EmbeddingSet::new(&embeddings)?;
        self.logger.timing("embed", elapsed_ms(stage));

        let stage = Instant::now();
        let graph = self.clusterer.build_graph(&embeddings)?;
        self.logger.timing("graph", elapsed_ms(stage));
        self.logger.metric("edges", graph.edge_count() as f64);

        let seed = self
            .settings
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        log::debug!("Clustering with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let stage = Instant::now();
        let mut assignment = self.clusterer.cluster_graph(&graph, &mut rng);
        self.logger.timing("cluster", elapsed_ms(stage));
        if self.settings.compact_labels {
            assignment = assignment.compacted();
        }
        self.logger.info(&format!(
            "   Found {} unique person(s) in the image",
            assignment.cluster_count()
        ));
        self.logger
            .metric("clusters", assignment.cluster_count() as f64);
        self.logger
            .metric("iterations", assignment.iterations() as f64);
        if !assignment.is_converged() {
            log::warn!(
                "Label propagation did not settle within {} passes",
                self.clusterer.max_iterations()
            );
        }

        let mut palette_rng = match self.settings.palette_seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let palette = PaletteAssigner::new(self.settings.palette.to_policy(), &mut palette_rng)?;

        let stage = Instant::now();
        let total = faces.len();
        let mut clustered = Vec::with_capacity(total);
        for (index, (bounding_box, label)) in assignment.join(faces)?.into_iter().enumerate() {
            let color = palette.color_for(label);
            self.renderer.draw_rectangle(
                &mut frame,
                &bounding_box,
                color,
                self.settings.box_thickness,
            )?;
            self.logger.progress(index + 1, total);
            clustered.push(ClusteredFace {
                index,
                bounding_box,
                label,
                color,
            });
        }
        self.logger.timing("render", elapsed_ms(stage));

        let stage = Instant::now();
        self.image_writer.write(output_path, &frame)?;
        self.logger.timing("write", elapsed_ms(stage));
        self.logger.summary();

        Ok(ClusterReport {
            faces: clustered,
            cluster_count: assignment.cluster_count(),
            iterations: assignment.iterations(),
            termination: assignment.termination(),
            seed,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::domain::chinese_whispers::ChineseWhispers;
    use crate::shared::constants::EMBEDDING_DIM;
    use crate::shared::embedding::Embedding;
    use crate::shared::frame::Frame;
    use crate::shared::settings::{PaletteKind, PaletteSettings};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImageReader {
        frame: Frame,
    }

    impl ImageReader for StubImageReader {
        fn read(&self, _path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            Ok(self.frame.clone())
        }
    }

    struct StubDetector {
        faces: Vec<BoundingBox>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self.faces.clone())
        }
    }

    struct StubEmbedder {
        embeddings: Vec<Embedding>,
        next: usize,
    }

    impl FaceEmbedder for StubEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            _face: &BoundingBox,
        ) -> Result<Embedding, Box<dyn std::error::Error>> {
            let e = self
                .embeddings
                .get(self.next)
                .copied()
                .ok_or("embedder ran out of fixtures")?;
            self.next += 1;
            Ok(e)
        }
    }

    struct FailingEmbedder;

    impl FaceEmbedder for FailingEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            _face: &BoundingBox,
        ) -> Result<Embedding, Box<dyn std::error::Error>> {
            Err("network unavailable".into())
        }
    }

    type DrawCalls = Arc<Mutex<Vec<(BoundingBox, Color, u32)>>>;

    struct RecordingRenderer {
        calls: DrawCalls,
    }

    impl BoxRenderer for RecordingRenderer {
        fn draw_rectangle(
            &self,
            _frame: &mut Frame,
            face: &BoundingBox,
            color: Color,
            thickness: u32,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push((*face, color, thickness));
            Ok(())
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    // --- Helpers ---

    const RED: Color = Color::new(255, 0, 0);
    const GREEN: Color = Color::new(0, 255, 0);

    fn at(x: f64) -> Embedding {
        let mut e = [0.0; EMBEDDING_DIM];
        e[0] = x;
        e
    }

    fn face(i: i32) -> BoundingBox {
        BoundingBox::new(i * 50, 10, 40, 40)
    }

    fn fixed_palette_settings() -> ClusterSettings {
        ClusterSettings {
            seed: Some(3),
            palette: PaletteSettings {
                kind: PaletteKind::Fixed,
                size: 0,
                colors: vec![RED, GREEN],
            },
            ..ClusterSettings::default()
        }
    }

    struct Harness {
        use_case: ClusterFacesUseCase,
        draws: DrawCalls,
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    fn harness(
        faces: Vec<BoundingBox>,
        embedder: Box<dyn FaceEmbedder>,
        settings: ClusterSettings,
    ) -> Harness {
        let draws: DrawCalls = Arc::new(Mutex::new(Vec::new()));
        let written = Arc::new(Mutex::new(Vec::new()));
        let clusterer = FaceClusterer::new(
            Box::new(ChineseWhispers::default()),
            settings.threshold,
            settings.max_iterations,
        )
        .unwrap();
        let use_case = ClusterFacesUseCase::new(
            Box::new(StubImageReader {
                frame: Frame::filled(400, 100, [0, 0, 0]),
            }),
            Box::new(StubDetector { faces }),
            embedder,
            clusterer,
            Box::new(RecordingRenderer {
                calls: draws.clone(),
            }),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            settings,
        );
        Harness {
            use_case,
            draws,
            written,
        }
    }

    fn embedder(embeddings: Vec<Embedding>) -> Box<dyn FaceEmbedder> {
        Box::new(StubEmbedder {
            embeddings,
            next: 0,
        })
    }

    // --- Tests ---

    #[test]
    fn test_groups_faces_and_colors_by_cluster() {
        let mut h = harness(
            vec![face(0), face(1), face(2), face(3)],
            embedder(vec![at(0.0), at(5.0), at(0.1), at(5.2)]),
            fixed_palette_settings(),
        );

        let report = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out.jpg"))
            .unwrap();

        assert_eq!(report.cluster_count, 2);
        assert_eq!(report.faces.len(), 4);
        assert_eq!(report.faces[0].label, report.faces[2].label);
        assert_eq!(report.faces[1].label, report.faces[3].label);
        assert_ne!(report.faces[0].label, report.faces[1].label);
        assert_eq!(report.faces[0].color, report.faces[2].color);
        assert_eq!(report.faces[3].bounding_box, face(3));
        assert_eq!(report.seed, 3);

        let draws = h.draws.lock().unwrap();
        assert_eq!(draws.len(), 4);
        assert!(draws.iter().all(|(_, _, thickness)| *thickness == 4));
        assert_eq!(draws[1].0, face(1));
    }

    #[test]
    fn test_colors_follow_label_modulo_palette() {
        let mut h = harness(
            vec![face(0), face(1), face(2)],
            embedder(vec![at(0.0), at(10.0), at(20.0)]),
            fixed_palette_settings(),
        );

        let report = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out.jpg"))
            .unwrap();

        // isolated faces keep their own index as label
        let labels: Vec<u32> = report.faces.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec![0, 1, 2]);
        let colors: Vec<Color> = report.faces.iter().map(|f| f.color).collect();
        assert_eq!(colors, vec![RED, GREEN, RED]);
    }

    #[test]
    fn test_compact_labels_option() {
        let settings = ClusterSettings {
            compact_labels: true,
            ..fixed_palette_settings()
        };
        let mut h = harness(
            vec![face(0), face(1), face(2)],
            embedder(vec![at(10.0), at(0.0), at(0.05)]),
            settings,
        );

        let report = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out.jpg"))
            .unwrap();

        let labels: Vec<u32> = report.faces.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec![0, 1, 1]);
    }

    #[test]
    fn test_no_faces_still_writes_image() {
        let mut h = harness(vec![], embedder(vec![]), fixed_palette_settings());

        let report = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out/result.jpg"))
            .unwrap();

        assert_eq!(report.cluster_count, 0);
        assert!(report.faces.is_empty());
        assert!(h.draws.lock().unwrap().is_empty());
        assert_eq!(
            *h.written.lock().unwrap(),
            vec![PathBuf::from("out/result.jpg")]
        );
    }

    #[test]
    fn test_same_seed_reproduces_report() {
        let run = || {
            let mut h = harness(
                (0..6).map(face).collect(),
                embedder((0..6).map(|i| at((i % 3) as f64 * 0.3)).collect()),
                fixed_palette_settings(),
            );
            h.use_case
                .execute(Path::new("in.jpg"), Path::new("out.jpg"))
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_random_palette_seed_pins_colors() {
        let settings = ClusterSettings {
            seed: Some(1),
            palette_seed: Some(99),
            ..ClusterSettings::default()
        };
        let run = |settings: ClusterSettings| {
            let mut h = harness(
                vec![face(0), face(1)],
                embedder(vec![at(0.0), at(3.0)]),
                settings,
            );
            h.use_case
                .execute(Path::new("in.jpg"), Path::new("out.jpg"))
                .unwrap()
        };
        let first = run(settings.clone());
        let second = run(settings);
        assert_eq!(first.faces[0].color, second.faces[0].color);
        assert_eq!(first.faces[1].color, second.faces[1].color);
    }

    #[test]
    fn test_embedder_failure_propagates() {
        let mut h = harness(
            vec![face(0)],
            Box::new(FailingEmbedder),
            fixed_palette_settings(),
        );
        let err = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out.jpg"))
            .unwrap_err();
        assert_eq!(err.to_string(), "network unavailable");
        assert!(h.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_embedding_rejected_before_clustering() {
        let mut h = harness(
            vec![face(0)],
            embedder(vec![at(f64::NAN)]),
            fixed_palette_settings(),
        );
        let result = h
            .use_case
            .execute(Path::new("in.jpg"), Path::new("out.jpg"));
        assert!(result.is_err());
        assert!(h.draws.lock().unwrap().is_empty());
    }
}
