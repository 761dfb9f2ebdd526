use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizreport_core::marks::calculate;
use quizreport_core::model::{AnswerOption, Question, QuestionType};
use quizreport_core::scale::{default_packet_scale, resolve};
use quizreport_core::scale_store::auto_generate;

fn question(i: usize, legacy: bool) -> Question {
    let options = if legacy {
        vec![
            AnswerOption::Legacy { text: "Yes".into() },
            AnswerOption::Legacy { text: "No".into() },
        ]
    } else {
        (0..4)
            .map(|m| AnswerOption::scored(format!("Option {m}"), (m + i as i64) % 5))
            .collect()
    };
    Question {
        id: format!("q{i}"),
        packet_id: "p1".into(),
        text: format!("Question {i}"),
        question_type: QuestionType::MultipleChoice,
        options,
        marks: legacy.then_some(2),
    }
}

fn bench_marks(c: &mut Criterion) {
    let mut group = c.benchmark_group("marks");

    let small: Vec<Question> = (0..5).map(|i| question(i, false)).collect();
    let mixed: Vec<Question> = (0..200).map(|i| question(i, i % 3 == 0)).collect();

    group.bench_function("small_packet", |b| b.iter(|| calculate(black_box(&small))));
    group.bench_function("mixed_200", |b| b.iter(|| calculate(black_box(&mixed))));

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let default = default_packet_scale();
    let generated = auto_generate(0, 120);

    group.bench_function("default_scale", |b| {
        b.iter(|| {
            for score in 0..15 {
                black_box(resolve(black_box(score), &default));
            }
        })
    });

    group.bench_function("generated_fallback", |b| {
        b.iter(|| {
            for score in -5..130 {
                black_box(resolve(black_box(score), &generated));
            }
        })
    });

    group.bench_function("auto_generate", |b| {
        b.iter(|| auto_generate(black_box(3), black_box(12)))
    });

    group.finish();
}

criterion_group!(benches, bench_marks, bench_resolve);
criterion_main!(benches);
