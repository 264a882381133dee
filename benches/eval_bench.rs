use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use schemelet::{Environment, eval_str, parse_program, tokenize};

const DEFINITIONS: &str = r#"
; Naive doubly recursive Fibonacci
(define fib
  (lambda (n)
    (if (= n 0)
        0
        (if (= n 1)
            1
            (+ (fib (- n 1)) (fib (- n 2)))))))

(define build
  (lambda (n acc)
    (if (= n 0)
        acc
        (build (- n 1) (cons n acc)))))

(define sum
  (lambda (xs)
    (if (= xs ())
        0
        (+ (car xs) (sum (cdr xs))))))
"#;

fn bench_reader(c: &mut Criterion) {
    let input = DEFINITIONS.repeat(20);
    c.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(&input))));
    c.bench_function("parse_program", |b| {
        b.iter(|| parse_program(black_box(&input)))
    });
}

fn bench_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for n in [10, 15, 20] {
        group.bench_with_input(BenchmarkId::new("fib", n), &n, |b, n| {
            let env = Environment::new_global();
            eval_str(DEFINITIONS, &env).expect("definitions should evaluate");
            let call = format!("(fib {})", n);
            b.iter(|| eval_str(black_box(&call), &env))
        });
    }
    group.bench_function("build-and-sum-200", |b| {
        let env = Environment::new_global();
        eval_str(DEFINITIONS, &env).expect("definitions should evaluate");
        b.iter(|| eval_str(black_box("(sum (build 200 ()))"), &env))
    });
    group.finish();
}

criterion_group!(benches, bench_reader, bench_evaluator);
criterion_main!(benches);
