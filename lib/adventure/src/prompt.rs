//! Indonesian prompt templates for scenario generation and evaluation.

use crate::model::{EvaluationRequest, GenerationRequest};

/// Most recent activities included in a scenario prompt.
const MAX_ACTIVITIES: usize = 3;

/// System instruction for the scenario writer.
#[must_use]
pub fn scenario_system_prompt(target_words: usize) -> String {
    format!(
        r#"Kamu adalah guru literasi keuangan yang menulis cerita petualangan uang singkat untuk anak-anak Indonesia.

ATURAN:
1. Tulis dalam bahasa Indonesia yang sederhana dan hangat untuk anak
2. Panjang cerita tidak lebih dari {target_words} kata
3. Arahkan dengan lembut, jangan menceramahi
4. JANGAN pernah menanyakan data pribadi (nama, alamat, nama sekolah)
5. JANGAN membahas topik keuangan orang dewasa (utang, kartu kredit, investasi rumit)
6. Ambil situasi sehari-hari anak: jajan, menabung, berbagi

Jawab hanya dengan JSON berbentuk:
{{
    "scenario": "Cerita situasi keuangan (maks {target_words} kata)",
    "choices": ["Pilihan pertama", "Pilihan kedua", "Pilihan ketiga"]
}}"#
    )
}

/// User instruction describing the child the scenario is written for.
#[must_use]
pub fn scenario_prompt(request: &GenerationRequest, target_words: usize) -> String {
    let mut prompt = format!(
        "Tulis satu cerita petualangan uang untuk anak berikut:\n\n\
         Profil anak:\n\
         - Usia: {} tahun\n\
         - Uang saku per hari: {}",
        request.age(),
        format_rupiah(request.daily_allowance()),
    );

    if let Some(goal) = request.goal_context() {
        prompt.push_str(&format!("\n- Sedang menabung untuk: {goal}"));
    }

    let activities = request.recent_activities();
    if !activities.is_empty() {
        let recent = activities
            .iter()
            .take(MAX_ACTIVITIES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!("\n- Kegiatan terakhir: {recent}"));
    }

    prompt.push_str(&format!(
        "\n\nSyarat cerita:\n\
         1. Cocok dengan usia dan dekat dengan keseharian anak Indonesia\n\
         2. Jumlah uang dalam cerita wajar, kira-kira sebesar uang sakunya\n\
         3. Melatih anak mengambil keputusan tentang uang\n\
         4. Berikan 3 pilihan yang berbeda (misalnya menabung, membelanjakan, berbagi)\n\
         5. Cerita paling banyak {target_words} kata\n\n\
         Ide situasi: menemukan uang, diberi uang oleh kakek atau nenek, diajak teman jajan, \
         melihat mainan atau buku yang diinginkan, teman yang sedang butuh bantuan.\n\n\
         Balas dengan JSON sesuai format!"
    ));

    prompt
}

/// Appends a notice that the previous answer was not valid JSON.
#[must_use]
pub fn with_parse_failure_notice(base: &str) -> String {
    format!(
        "{base}\n\nPERHATIAN: Jawaban sebelumnya tidak bisa dibaca sebagai JSON. \
         Balas HANYA dengan JSON yang valid, tanpa teks lain."
    )
}

/// Appends a notice that the previous scenario was too long.
#[must_use]
pub fn with_length_notice(base: &str, word_count: usize, target_words: usize) -> String {
    format!(
        "{base}\n\nPERHATIAN: Cerita sebelumnya terdiri dari {word_count} kata, terlalu panjang. \
         Tulis ulang cerita dengan kurang dari {target_words} kata."
    )
}

/// System instruction for the choice evaluator.
pub const EVALUATOR_SYSTEM_PROMPT: &str = r#"Kamu adalah guru literasi keuangan yang menilai keputusan uang anak-anak Indonesia.

ATURAN:
1. Pakai bahasa Indonesia yang ramah dan menyemangati
2. Umpan balik cukup 2-3 kalimat
3. Mulai dari sisi baik pilihan anak
4. Kalau perlu, beri saran perbaikan dengan lembut
5. JANGAN menghakimi atau membuat anak merasa bersalah

Nilai pilihan pada 3 dimensi, masing-masing 0.0 sampai 1.0:
- age_appropriateness: seberapa cocok keputusan ini untuk usia anak
- goal_alignment: seberapa mendukung tujuan menabungnya
- financial_reasoning: seberapa baik pertimbangan keuangannya

Jawab hanya dengan JSON berbentuk:
{
    "feedback": "Umpan balik yang mendukung (2-3 kalimat)",
    "scores": {
        "age_appropriateness": 0.85,
        "goal_alignment": 0.75,
        "financial_reasoning": 0.9
    }
}"#;

/// User instruction describing the choice to evaluate.
#[must_use]
pub fn evaluation_prompt(request: &EvaluationRequest) -> String {
    let mut prompt = format!(
        "Nilai keputusan anak berikut.\n\n\
         Cerita:\n{}\n\n\
         Profil anak:\n\
         - Usia: {} tahun\n\
         - Pilihan anak: {}",
        request.scenario(),
        request.age(),
        request.choice_text(),
    );

    if !request.amounts().is_empty() {
        let amounts = request
            .amounts()
            .iter()
            .map(|(name, value)| format!("{name}: {}", format_rupiah(*value)))
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!("\n- Jumlah uang terkait: {amounts}"));
    }

    prompt.push_str(
        "\n\nDalam menilai, pertimbangkan:\n\
         - Apakah pilihan ini masuk akal untuk usianya?\n\
         - Apakah pilihan ini mendukung tujuan menabungnya (jika ada)?\n\
         - Apakah terlihat cara berpikir keuangan yang baik?\n\n\
         Balas dengan JSON sesuai format!",
    );

    prompt
}

/// Formats an amount as whole rupiah with comma grouping, e.g. `Rp 10,000`.
#[must_use]
pub fn format_rupiah(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("Rp -{grouped}")
    } else {
        format!("Rp {grouped}")
    }
}
