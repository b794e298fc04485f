//! 考勤模型
//!
//! 统计数据始终由学生条目派生，记录上不存在可单独修改的计数字段。

use serde::{Deserialize, Serialize};

// =========================================================
// 学生条目
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudentEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub absent: bool,
    #[serde(default)]
    pub uniform: bool,
    #[serde(rename = "noHW", default)]
    pub homework_missing: bool,
    #[serde(rename = "noCW", default)]
    pub classwork_missing: bool,
}

impl StudentEntry {
    /// 新建表单行：未到、作业与课堂作业默认缺交
    pub fn blank() -> Self {
        Self {
            homework_missing: true,
            classwork_missing: true,
            ..Default::default()
        }
    }

    /// 切换出勤状态，present 与 absent 始终互斥
    pub fn toggle_presence(&mut self) {
        self.present = !self.present;
        self.absent = !self.present;
    }
}

// =========================================================
// 派生统计
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub uniform_count: usize,
    pub no_uniform_count: usize,
    pub hw_count: usize,
    pub no_hw_count: usize,
    pub cw_count: usize,
    pub no_cw_count: usize,
}

impl AttendanceStats {
    pub fn from_entries(entries: &[StudentEntry]) -> Self {
        let count = |pred: fn(&StudentEntry) -> bool| entries.iter().filter(|e| pred(e)).count();
        Self {
            total_students: entries.len(),
            present_count: count(|e| e.present),
            absent_count: count(|e| e.absent),
            uniform_count: count(|e| e.uniform),
            no_uniform_count: count(|e| !e.uniform),
            hw_count: count(|e| !e.homework_missing),
            no_hw_count: count(|e| e.homework_missing),
            cw_count: count(|e| !e.classwork_missing),
            no_cw_count: count(|e| e.classwork_missing),
        }
    }
}

// =========================================================
// 考勤记录
// =========================================================

/// 考勤接口的两个路径前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttendanceScope {
    #[default]
    General,
    Babysitter,
}

impl AttendanceScope {
    pub fn base_path(&self) -> &'static str {
        match self {
            AttendanceScope::General => "/attendance",
            AttendanceScope::Babysitter => "/babysitter/attendance",
        }
    }
}

/// 服务端返回的统计字段会被忽略，统计只能通过 `stats()` 获得
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default, alias = "createdAt")]
    pub date: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// 班级总人数（可能大于当日录入的人数）
    #[serde(default)]
    pub student_count: usize,
    #[serde(default)]
    students: Vec<StudentEntry>,
}

impl AttendanceRecord {
    pub fn new(
        date: String,
        grade: Option<String>,
        section: Option<String>,
        student_count: usize,
        students: Vec<StudentEntry>,
    ) -> Self {
        Self {
            id: String::new(),
            date,
            grade,
            section,
            student_count,
            students,
        }
    }

    pub fn students(&self) -> &[StudentEntry] {
        &self.students
    }

    pub fn stats(&self) -> AttendanceStats {
        AttendanceStats::from_entries(&self.students)
    }
}

// =========================================================
// 录入表单
// =========================================================

/// "点名"表单的内存状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttendanceSheet {
    pub students: Vec<StudentEntry>,
    pub total_count: usize,
}

impl AttendanceSheet {
    /// `today` 为当日录入行数，`total` 为班级总人数（缺省同 today）
    pub fn new(today: usize, total: Option<usize>) -> Self {
        Self {
            students: vec![StudentEntry::blank(); today],
            total_count: total.unwrap_or(today).max(today),
        }
    }

    /// 返回第一个未填写姓名的行号
    pub fn first_missing_name(&self) -> Option<usize> {
        self.students.iter().position(|s| s.name.trim().is_empty())
    }

    pub fn stats(&self) -> AttendanceStats {
        AttendanceStats::from_entries(&self.students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(present: bool, uniform: bool, no_hw: bool, no_cw: bool) -> StudentEntry {
        StudentEntry {
            name: "s".into(),
            gender: "F".into(),
            present,
            absent: !present,
            uniform,
            homework_missing: no_hw,
            classwork_missing: no_cw,
        }
    }

    #[test]
    fn stats_match_predicates() {
        let entries = vec![
            entry(true, true, false, false),
            entry(true, false, true, false),
            entry(false, false, true, true),
        ];
        let stats = AttendanceStats::from_entries(&entries);
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.present_count, 2);
        assert_eq!(stats.absent_count, 1);
        assert_eq!(stats.uniform_count, 1);
        assert_eq!(stats.no_uniform_count, 2);
        assert_eq!(stats.hw_count, 1);
        assert_eq!(stats.no_hw_count, 2);
        assert_eq!(stats.cw_count, 2);
        assert_eq!(stats.no_cw_count, 1);
    }

    #[test]
    fn server_stats_are_ignored() {
        let json = r#"{
            "_id": "r1",
            "date": "2024-05-01",
            "studentCount": 30,
            "students": [
                {"name":"A","gender":"M","present":true,"absent":false,"uniform":true,"noHW":false,"noCW":false}
            ],
            "stats": {"totalStudents": 99, "presentCount": 99}
        }"#;
        let record: AttendanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.stats().total_students, 1);
        assert_eq!(record.stats().present_count, 1);
        assert_eq!(record.student_count, 30);
    }

    #[test]
    fn toggle_keeps_flags_exclusive() {
        let mut e = StudentEntry::blank();
        assert!(!e.present && !e.absent);
        e.toggle_presence();
        assert!(e.present && !e.absent);
        e.toggle_presence();
        assert!(!e.present && e.absent);
    }

    #[test]
    fn sheet_defaults_and_validation() {
        let mut sheet = AttendanceSheet::new(3, Some(25));
        assert_eq!(sheet.total_count, 25);
        assert!(sheet.students.iter().all(|s| s.homework_missing && s.classwork_missing));
        assert_eq!(sheet.first_missing_name(), Some(0));

        for (i, s) in sheet.students.iter_mut().enumerate() {
            s.name = format!("Student {i}");
        }
        sheet.students[1].name = "  ".into();
        assert_eq!(sheet.first_missing_name(), Some(1));

        assert_eq!(AttendanceSheet::new(4, None).total_count, 4);
        assert_eq!(AttendanceSheet::new(4, Some(2)).total_count, 4);
    }

    #[test]
    fn scope_paths() {
        assert_eq!(AttendanceScope::General.base_path(), "/attendance");
        assert_eq!(AttendanceScope::Babysitter.base_path(), "/babysitter/attendance");
    }
}
