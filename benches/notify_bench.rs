//! 通知中心性能基准测试
//!
//! 测试覆盖：
//! - 模板渲染性能（变量替换与条件块）
//! - 投递匹配判定性能
//! - 不同列表规模下的过滤排序性能

use std::collections::HashMap;
use std::hint::black_box;

use chrono::NaiveTime;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use notify_center::{
    GlobalSettings, NotificationChannel, NotificationDraft, NotificationFilter,
    NotificationPriority, NotificationStore, NotificationType, QuietHours, TemplateEngine,
    TemplateValue, builtin_templates, should_show_notification,
};

fn bench_template_render(c: &mut Criterion) {
    let engine = TemplateEngine::new();
    let mut variables = HashMap::new();
    variables.insert("taskName".to_string(), TemplateValue::from("数据导出"));
    variables.insert("hasOutput".to_string(), TemplateValue::from(true));

    c.bench_function("template_render_simple", |b| {
        b.iter(|| {
            engine
                .render(black_box("{{taskName}} 已完成"), black_box(&variables))
                .unwrap()
        })
    });

    c.bench_function("template_render_conditional", |b| {
        b.iter(|| {
            engine
                .render(
                    black_box("{{taskName}} 已完成{{#if hasOutput}}，产出已就绪{{/if}}"),
                    black_box(&variables),
                )
                .unwrap()
        })
    });

    let templates = builtin_templates();
    let template = templates.iter().find(|t| t.id == "task_completed").unwrap();
    c.bench_function("template_instantiate", |b| {
        b.iter(|| {
            engine
                .instantiate(
                    black_box(template),
                    black_box(&variables),
                    Default::default(),
                )
                .unwrap()
        })
    });
}

fn bench_matcher(c: &mut Criterion) {
    let record = notify_center::NotificationRecord::new(NotificationType::Task, "标题", "正文")
        .with_priority(NotificationPriority::High)
        .with_category("task");
    let channel = NotificationChannel::new("ch", "渠道")
        .with_categories(["task", "chat", "system"])
        .with_min_priority(NotificationPriority::Normal)
        .with_quiet_hours(QuietHours::new("22:00", "08:00"));
    let settings = GlobalSettings {
        quiet_hours_enabled: true,
        ..Default::default()
    };
    let now = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

    c.bench_function("matcher_full_checks", |b| {
        b.iter(|| {
            should_show_notification(
                black_box(&record),
                black_box(&channel),
                black_box(&settings),
                black_box(now),
            )
        })
    });
}

fn bench_filtered_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_notifications");

    for size in [100usize, 1_000, 5_000] {
        let store = NotificationStore::new();
        for i in 0..size {
            store
                .add_notification(NotificationDraft {
                    title: Some(format!("通知 {i}")),
                    category: Some(if i % 3 == 0 { "task" } else { "chat" }.to_string()),
                    priority: Some(if i % 7 == 0 {
                        NotificationPriority::High
                    } else {
                        NotificationPriority::Normal
                    }),
                    ..Default::default()
                })
                .unwrap();
        }
        store.set_filter(NotificationFilter {
            category: Some("task".to_string()),
            read: Some(false),
            ..Default::default()
        });

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| black_box(store.get_filtered_notifications()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_template_render, bench_matcher, bench_filtered_list);
criterion_main!(benches);
