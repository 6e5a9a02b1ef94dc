/// Prayer time calculation methods understood by the API

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
  pub id: u8,
  pub name: &'static str,
  pub description: &'static str,
}

/// All available methods, indexed by id
pub const METHODS: &[Method] = &[
  Method {
    id: 0,
    name: "Shia Ithna-Ashari",
    description: "Shia Ithna-Ashari, Leva Institute, Qum",
  },
  Method {
    id: 1,
    name: "University of Islamic Sciences, Karachi",
    description: "University of Islamic Sciences, Karachi",
  },
  Method {
    id: 2,
    name: "Islamic Society of North America",
    description: "Islamic Society of North America (ISNA)",
  },
  Method {
    id: 3,
    name: "Muslim World League",
    description: "Muslim World League (MWL)",
  },
  Method {
    id: 4,
    name: "Umm Al-Qura University, Makkah",
    description: "Umm Al-Qura University, Makkah",
  },
  Method {
    id: 5,
    name: "Egyptian General Authority of Survey",
    description: "Egyptian General Authority of Survey",
  },
  Method {
    id: 6,
    name: "Institute of Geophysics, University of Tehran",
    description: "Institute of Geophysics, University of Tehran",
  },
  Method {
    id: 7,
    name: "Gulf Region",
    description: "Gulf Region",
  },
  Method {
    id: 8,
    name: "Kuwait",
    description: "Kuwait",
  },
  Method {
    id: 9,
    name: "Qatar",
    description: "Qatar",
  },
  Method {
    id: 10,
    name: "Majlis Ugama Islam Singapura",
    description: "Majlis Ugama Islam Singapura, Singapore",
  },
  Method {
    id: 11,
    name: "Union Organization Islamic de France",
    description: "Union Organization Islamic de France",
  },
  Method {
    id: 12,
    name: "Diyanet İşleri Başkanlığı",
    description: "Diyanet İşleri Başkanlığı, Turkey",
  },
  Method {
    id: 13,
    name: "Spiritual Administration of Muslims of Russia",
    description: "Spiritual Administration of Muslims of Russia",
  },
  Method {
    id: 14,
    name: "Moonsighting Committee Worldwide",
    description: "Moonsighting Committee Worldwide",
  },
  Method {
    id: 15,
    name: "Dubai",
    description: "Dubai (experimental)",
  },
  Method {
    id: 16,
    name: "JAKIM",
    description: "Jabatan Kemajuan Islam Malaysia (JAKIM)",
  },
  Method {
    id: 17,
    name: "Tunisia",
    description: "Ministry of Religious Affairs, Tunisia",
  },
  Method {
    id: 18,
    name: "Algeria",
    description: "Ministry of Religious Affairs and Wakfs, Algeria",
  },
  Method {
    id: 19,
    name: "KEMENAG",
    description: "Kementerian Agama Republik Indonesia",
  },
  Method {
    id: 20,
    name: "Morocco",
    description: "Ministry of Habous and Islamic Affairs, Morocco",
  },
  Method {
    id: 21,
    name: "Comunidade Islamica de Lisboa",
    description: "Comunidade Islamica de Lisboa, Portugal",
  },
  Method {
    id: 22,
    name: "MUIS",
    description: "Ministry of Religious Affairs of Jordan",
  },
  Method {
    id: 23,
    name: "Custom",
    description: "Custom setting",
  },
];

pub fn by_id(id: u8) -> Option<&'static Method> {
  METHODS.iter().find(|m| m.id == id)
}

pub fn name(id: u8) -> &'static str {
  by_id(id).map_or("Unknown", |m| m.name)
}

/// Methods whose id, name or description matches `query`, case-insensitively.
pub fn filter(query: &str) -> Vec<&'static Method> {
  let query = query.trim().to_lowercase();
  if query.is_empty() {
    return METHODS.iter().collect();
  }

  METHODS
    .iter()
    .filter(|m| {
      m.id.to_string() == query
        || m.name.to_lowercase().contains(&query)
        || m.description.to_lowercase().contains(&query)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::MAX_METHOD;

  #[test]
  fn test_table_covers_every_id_in_order() {
    assert_eq!(METHODS.len(), usize::from(MAX_METHOD) + 1);
    for (index, method) in METHODS.iter().enumerate() {
      assert_eq!(usize::from(method.id), index);
    }
  }

  #[test]
  fn test_name_lookup() {
    assert_eq!(name(5), "Egyptian General Authority of Survey");
    assert_eq!(name(99), "Unknown");
  }

  #[test]
  fn test_filter() {
    assert_eq!(filter("").len(), METHODS.len());
    assert_eq!(filter("3")[0].name, "Muslim World League");

    let ids: Vec<u8> = filter("MINISTRY").iter().map(|m| m.id).collect();
    assert_eq!(ids, [17, 18, 20, 22]);

    assert!(filter("atlantis").is_empty());
  }
}
